//! Incremental rebuilds driven by filesystem change events.
//!
//! ```text
//! notify::Event ──► ChangeEvent ──► ChangeReactor::handle()
//!                                        │
//!                     categorize(key) ───┼── Content: cache → page → dependents
//!                                        ├── Layout:  cache → dependents
//!                                        ├── Static:  copy / remove
//!                                        └── Unknown: ignored
//! ```
//!
//! A created directory is replayed file by file. A removed directory is
//! matched against the cached keys below it.
//!
//! The reactor is the single owner of the [`Site`]; events are handled one
//! at a time, each including its cascade of dependent re-renders.

use crate::assets::{collect_all_files, copy_static, remove_static, static_target};
use crate::site::Site;
use crate::utils::category::{PathClass, categorize, is_temp_file};
use crate::{debug, log};
use anyhow::{Context, Result};
use notify::event::{EventKind, ModifyKind, RenameMode};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A change to one path, as seen by the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// Translate a watcher event. Access and other events yield nothing.
    pub fn from_notify(event: notify::Event) -> Vec<Self> {
        let notify::Event { kind, mut paths, .. } = event;

        match kind {
            EventKind::Create(_) => paths.into_iter().map(Self::Created).collect(),
            EventKind::Remove(_) => paths.into_iter().map(Self::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                let to = paths.pop().unwrap_or_default();
                let from = paths.pop().unwrap_or_default();
                vec![Self::Moved { from, to }]
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.into_iter().map(Self::Removed).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.into_iter().map(Self::Created).collect()
            }
            // Some backends cannot tell which side of a rename a path is on
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .into_iter()
                .map(|path| {
                    if path.exists() {
                        Self::Created(path)
                    } else {
                        Self::Removed(path)
                    }
                })
                .collect(),
            EventKind::Modify(_) => paths.into_iter().map(Self::Modified).collect(),
            _ => Vec::new(),
        }
    }
}

/// Outputs touched while handling one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Content-relative filepaths of re-rendered pages
    pub rendered: Vec<String>,
    /// Static files copied into the output directory
    pub copied: Vec<PathBuf>,
    /// Output files deleted
    pub removed: Vec<PathBuf>,
}

impl Reaction {
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.copied.is_empty() && self.removed.is_empty()
    }

    fn merge(&mut self, other: Self) {
        for filepath in other.rendered {
            if !self.rendered.contains(&filepath) {
                self.rendered.push(filepath);
            }
        }
        self.copied.extend(other.copied);
        self.removed.extend(other.removed);
    }
}

/// Applies change events to a [`Site`] and its output directory.
#[derive(Debug)]
pub struct ChangeReactor {
    site: Site,
}

impl ChangeReactor {
    pub fn new(site: Site) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Handle one event.
    pub fn handle(&mut self, event: &ChangeEvent) -> Result<Reaction> {
        match event {
            ChangeEvent::Created(path) => self.created(path),
            ChangeEvent::Modified(path) => self.modified(path),
            ChangeEvent::Removed(path) => self.removed(path),
            ChangeEvent::Moved { from, to } => {
                let mut reaction = self.removed(from)?;
                reaction.merge(self.created(to)?);
                Ok(reaction)
            }
        }
    }

    /// Logical key and class of a path, or `None` for paths outside the project.
    fn classify(&self, path: &Path) -> Option<(String, PathClass)> {
        let key = self.site.paths().relative(path)?;
        let class = categorize(&key, self.site.paths());
        debug!("reactor"; "{key}: {}", class.name());
        (class != PathClass::Unknown).then_some((key, class))
    }

    fn created(&mut self, path: &Path) -> Result<Reaction> {
        let Some((key, class)) = self.classify(path) else {
            return Ok(Reaction::default());
        };
        if path.is_dir() {
            return Ok(self.created_dir(path));
        }

        match class {
            PathClass::Static => self.copy(&key),
            PathClass::Content | PathClass::Layout => self.update(&key, class),
            PathClass::Unknown => Ok(Reaction::default()),
        }
    }

    /// Replay every file below a new directory as a creation.
    ///
    /// One bad file does not stop the rest.
    fn created_dir(&mut self, dir: &Path) -> Reaction {
        let mut reaction = Reaction::default();
        for file in collect_all_files(dir) {
            if is_temp_file(&file) {
                continue;
            }
            match self.created(&file) {
                Ok(other) => reaction.merge(other),
                Err(err) => log!("error"; "{}: {err:#}", file.display()),
            }
        }
        reaction
    }

    fn modified(&mut self, path: &Path) -> Result<Reaction> {
        let Some((key, class)) = self.classify(path) else {
            return Ok(Reaction::default());
        };

        match class {
            PathClass::Static => self.copy(&key),
            PathClass::Content | PathClass::Layout => self.update(&key, class),
            PathClass::Unknown => Ok(Reaction::default()),
        }
    }

    /// Re-cache a content or layout file and refresh it if its text changed.
    fn update(&mut self, key: &str, class: PathClass) -> Result<Reaction> {
        let store = self.site.store_mut();
        // A vanished file is handled by its remove event
        let Some(fresh) = store.peek(key) else {
            return Ok(Reaction::default());
        };
        if store.get(key) == Some(fresh.as_str()) {
            debug!("reactor"; "{key} unchanged");
            return Ok(Reaction::default());
        }
        store.set(key, fresh);
        self.refresh(key, class)
    }

    /// Handle a deleted path. The path is gone, so a directory is
    /// recognized by the cached files below it.
    fn removed(&mut self, path: &Path) -> Result<Reaction> {
        let Some((key, class)) = self.classify(path) else {
            return Ok(Reaction::default());
        };
        let mut reaction = Reaction::default();

        match class {
            PathClass::Static => {
                let Ok(target) = static_target(&key, self.site.paths()) else {
                    return Ok(reaction);
                };
                if target.is_dir() {
                    reaction.removed = self.remove_static_dir(&target)?;
                } else {
                    reaction.removed.extend(remove_static(&key, self.site.paths())?);
                }
            }
            PathClass::Content | PathClass::Layout => {
                let nested = self.site.store().keys_under(&key);
                if nested.is_empty() {
                    reaction.removed = self.remove_key(&key, class)?;
                } else {
                    for nested_key in nested {
                        reaction.removed.extend(self.remove_key(&nested_key, class)?);
                    }
                }
            }
            PathClass::Unknown => {}
        }

        if !reaction.removed.is_empty() {
            log!("reactor"; "removed {key}");
        }
        Ok(reaction)
    }

    /// Drop one cached file, and its page and output for content.
    fn remove_key(&mut self, key: &str, class: PathClass) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        if class == PathClass::Content
            && let Some(filepath) = self.site.content_id(key)
        {
            removed.extend(self.site.remove_page(&filepath)?);
        }
        self.forget(key)?;
        Ok(removed)
    }

    /// Delete the copies of a removed static directory.
    ///
    /// Output files that belong to a page share the tree and are kept.
    fn remove_static_dir(&self, target: &Path) -> Result<Vec<PathBuf>> {
        let output = &self.site.paths().output;
        let pages: BTreeSet<PathBuf> = self
            .site
            .pagedata()
            .values()
            .filter_map(|page| page.target().ok())
            .map(|rel| output.join(rel))
            .collect();

        let mut removed = Vec::new();
        for file in collect_all_files(target) {
            if pages.contains(&file) {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {}", file.display()))?;
            removed.push(file);
        }
        Ok(removed)
    }

    /// Re-render whatever depends on a freshly cached content or layout file.
    fn refresh(&mut self, key: &str, class: PathClass) -> Result<Reaction> {
        let mut reaction = Reaction::default();

        let id = match class {
            PathClass::Content => {
                let Some(filepath) = self.site.content_id(key) else {
                    return Ok(reaction);
                };
                let rendered = self.site.render_page(&filepath)?;
                if let Some(page) = self.site.page(&filepath) {
                    debug!("reactor"; "{filepath} -> {}", page.url);
                }
                reaction.rendered.push(filepath.clone());
                reaction.removed.extend(rendered.stale);
                filepath
            }
            _ => match self.site.layout_id(key) {
                Some(id) => id,
                None => return Ok(reaction),
            },
        };

        let dependents = self.site.render_dependents(&id)?;
        reaction.merge(Reaction {
            rendered: dependents,
            ..Reaction::default()
        });

        log!("reactor"; "{key} changed, rendered {} pages", reaction.rendered.len());
        Ok(reaction)
    }

    fn copy(&self, key: &str) -> Result<Reaction> {
        if !self.site.paths().absolute(key).is_file() {
            return Ok(Reaction::default());
        }
        let target = copy_static(key, self.site.paths())?;
        log!("reactor"; "copied {key}");
        Ok(Reaction {
            copied: vec![target],
            ..Reaction::default()
        })
    }

    /// Drop a cache entry, if there is one.
    fn forget(&mut self, key: &str) -> Result<()> {
        let store = self.site.store_mut();
        if store.contains(key) {
            store.delete(key)?;
        }
        Ok(())
    }
}
