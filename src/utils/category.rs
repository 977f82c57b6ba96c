//! Path classification for watch mode and incremental builds.
//!
//! Every change event is classified by the top-level project directory it
//! falls under, which decides how the change reactor handles it.
//!
//! # Path Classes
//!
//! | Class    | Handling                                   | Example Files                |
//! |----------|--------------------------------------------|------------------------------|
//! | Content  | Re-render page, then its dependents        | `content/articles/hello.md`  |
//! | Layout   | Re-render dependents only                  | `layouts/basic.html`         |
//! | Static   | Copied verbatim                            | `static/site.css`            |
//! | Unknown  | Ignored (output dir, config, temp files)   | `output/index.html`          |

use crate::config::SitePaths;
use crate::utils::path::relative_to;
use std::path::Path;

/// Class of a changed path, used to pick a handler in watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Page source below the content directory
    Content,
    /// Shared template below the layouts directory
    Layout,
    /// File copied as-is below the static directory
    Static,
    /// Anything else
    Unknown,
}

impl PathClass {
    /// Get the short name for this class (used in logs)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Layout => "layout",
            Self::Static => "static",
            Self::Unknown => "unknown",
        }
    }
}

/// Classify a logical root-relative path.
///
/// The path itself must lie strictly below a directory; the directory entry
/// is `Unknown`.
pub fn categorize(key: &str, paths: &SitePaths) -> PathClass {
    let below = |dir: String| relative_to(key, &dir).is_some_and(|rel| !rel.is_empty());

    if below(paths.output_key()) {
        PathClass::Unknown
    } else if below(paths.content_key()) {
        PathClass::Content
    } else if below(paths.layouts_key()) {
        PathClass::Layout
    } else if below(paths.static_key()) {
        PathClass::Static
    } else {
        PathClass::Unknown
    }
}

/// Editor swap and backup files that should never trigger a rebuild.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> SitePaths {
        SitePaths::new(
            Path::new("/site"),
            Path::new("content"),
            Path::new("layouts"),
            Path::new("static"),
            Path::new("output"),
        )
    }

    #[test]
    fn test_class_name() {
        assert_eq!(PathClass::Content.name(), "content");
        assert_eq!(PathClass::Layout.name(), "layout");
        assert_eq!(PathClass::Static.name(), "static");
        assert_eq!(PathClass::Unknown.name(), "unknown");
    }

    #[test]
    fn test_categorize() {
        let paths = paths();
        assert_eq!(categorize("content/articles/hello.md", &paths), PathClass::Content);
        assert_eq!(categorize("layouts/basic.html", &paths), PathClass::Layout);
        assert_eq!(categorize("static/img/logo.png", &paths), PathClass::Static);
        assert_eq!(categorize("output/index.html", &paths), PathClass::Unknown);
        assert_eq!(categorize("glaze.toml", &paths), PathClass::Unknown);
    }

    #[test]
    fn test_categorize_directory_itself_is_unknown() {
        let paths = paths();
        assert_eq!(categorize("content", &paths), PathClass::Unknown);
    }

    #[test]
    fn test_categorize_prefix_is_not_a_match() {
        let paths = paths();
        assert_eq!(categorize("contents/a.md", &paths), PathClass::Unknown);
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("content/index.html~")));
        assert!(is_temp_file(Path::new("content/.index.html.swp")));
        assert!(is_temp_file(Path::new("layouts/basic.html.bak")));
        assert!(!is_temp_file(Path::new("content/index.html")));
    }
}
