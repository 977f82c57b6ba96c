//! File system watcher for incremental rebuilds.
//!
//! Monitors the content, layouts and static directories and feeds every
//! change to the [`ChangeReactor`], which re-renders only what is affected.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Event Loop                          │
//! │                                                          │
//! │  ┌──────────┐    ┌─────────────┐    ┌─────────────────┐  │
//! │  │ notify   │───▶│ ChangeEvent │───▶│ ChangeReactor   │  │
//! │  │ events   │    │ (temp files │    │ (one event at a │  │
//! │  └──────────┘    │  dropped)   │    │  time)          │  │
//! │                  └─────────────┘    └─────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no debouncing. Duplicate modify events are absorbed by the
//! reactor, which compares fresh file content against its cache.

use crate::log;
use crate::reactor::{ChangeEvent, ChangeReactor};
use crate::utils::category::is_temp_file;
use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;

// =============================================================================
// Path Utilities
// =============================================================================

/// Format absolute path as relative to root, with trailing slash.
fn format_rel(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    format!("{}/", rel.display())
}

/// Drop the editor-artifact side of an event.
///
/// A move onto a temp file is a removal of the source, and a move off one
/// (an atomic save) is a creation of the target.
fn without_temp_files(event: ChangeEvent) -> Option<ChangeEvent> {
    match event {
        ChangeEvent::Created(ref path)
        | ChangeEvent::Modified(ref path)
        | ChangeEvent::Removed(ref path) => (!is_temp_file(path)).then_some(event),
        ChangeEvent::Moved { from, to } => match (is_temp_file(&from), is_temp_file(&to)) {
            (false, false) => Some(ChangeEvent::Moved { from, to }),
            (false, true) => Some(ChangeEvent::Removed(from)),
            (true, false) => Some(ChangeEvent::Created(to)),
            (true, true) => None,
        },
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, reactor: &ChangeReactor) -> Result<()> {
    let paths = reactor.site().paths();
    let mut watched = Vec::new();

    for (name, dir) in [
        ("content", &paths.content),
        ("layouts", &paths.layouts),
        ("static", &paths.static_dir),
    ] {
        if !dir.is_dir() {
            continue;
        }
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {name}: {}", dir.display()))?;
        watched.push(format_rel(dir, &paths.root));
    }

    if !watched.is_empty() {
        log!("watch"; "watching {}", watched.join(", "));
    }
    Ok(())
}

// =============================================================================
// Public API
// =============================================================================

/// Start a blocking file watcher that applies every change through `reactor`.
///
/// Returns when the watcher's channel disconnects. A failing event is
/// logged and the loop carries on.
pub fn watch_for_changes_blocking(mut reactor: ChangeReactor) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &reactor)?;

    for result in rx {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                log!("watch"; "error: {e}");
                continue;
            }
        };

        for change in ChangeEvent::from_notify(event)
            .into_iter()
            .filter_map(without_temp_files)
        {
            if let Err(e) = reactor.handle(&change) {
                log!("watch"; "failed to apply {change:?}");
                log!("watch"; "{e:#}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_without_temp_files() {
        let page = PathBuf::from("/site/content/a.md");
        let swap = PathBuf::from("/site/content/.a.md.swp");
        let backup = PathBuf::from("/site/content/a.md~");

        assert_eq!(
            without_temp_files(ChangeEvent::Modified(page.clone())),
            Some(ChangeEvent::Modified(page.clone()))
        );
        assert_eq!(without_temp_files(ChangeEvent::Modified(swap.clone())), None);
        assert_eq!(without_temp_files(ChangeEvent::Created(backup.clone())), None);
        assert_eq!(without_temp_files(ChangeEvent::Removed(backup.clone())), None);
        assert_eq!(
            without_temp_files(ChangeEvent::Moved { from: swap.clone(), to: backup.clone() }),
            None
        );
    }

    #[test]
    fn test_moves_across_temp_files() {
        let page = PathBuf::from("/site/content/a.md");
        let other = PathBuf::from("/site/content/b.md");
        let backup = PathBuf::from("/site/content/a.md~");
        let tmp = PathBuf::from("/site/content/a.md.tmp");

        // save via backup: the original is moved aside, then a temp file takes its place
        assert_eq!(
            without_temp_files(ChangeEvent::Moved { from: page.clone(), to: backup }),
            Some(ChangeEvent::Removed(page.clone()))
        );
        assert_eq!(
            without_temp_files(ChangeEvent::Moved { from: tmp, to: page.clone() }),
            Some(ChangeEvent::Created(page.clone()))
        );
        assert_eq!(
            without_temp_files(ChangeEvent::Moved { from: page.clone(), to: other.clone() }),
            Some(ChangeEvent::Moved { from: page, to: other })
        );
    }

    #[test]
    fn test_format_rel() {
        assert_eq!(
            format_rel(Path::new("/site/content"), Path::new("/site")),
            "content/"
        );
    }
}
