//! Resolved project layout.
//!
//! ```text
//! SiteConfig
//!     │
//!     └── paths() → SitePaths
//!                       │
//!                       ├── root / content / layouts / static_dir / output  (absolute)
//!                       ├── content_key() → "content"   (logical, root-relative)
//!                       └── relative(path) → "content/articles/hello.md"
//! ```
//!
//! Cache keys in the content store are logical root-relative paths, so every
//! filesystem path (absolute from the watcher, or relative from a walk) goes
//! through [`SitePaths::relative`] before it reaches the store.

use crate::utils::path::to_logical;
use std::path::{Path, PathBuf};

/// Absolute directories of a project plus their logical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub content: PathBuf,
    pub layouts: PathBuf,
    pub static_dir: PathBuf,
    pub output: PathBuf,
}

impl SitePaths {
    /// Resolve directories against a root, without touching the filesystem.
    pub fn new(root: &Path, content: &Path, layouts: &Path, static_dir: &Path, output: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            content: root.join(content),
            layouts: root.join(layouts),
            static_dir: root.join(static_dir),
            output: root.join(output),
        }
    }

    /// Logical name of the content directory (`"content"`).
    pub fn content_key(&self) -> String {
        self.key_of(&self.content)
    }

    /// Logical name of the layouts directory (`"layouts"`).
    pub fn layouts_key(&self) -> String {
        self.key_of(&self.layouts)
    }

    /// Logical name of the static directory (`"static"`).
    pub fn static_key(&self) -> String {
        self.key_of(&self.static_dir)
    }

    /// Logical name of the output directory (`"output"`).
    pub fn output_key(&self) -> String {
        self.key_of(&self.output)
    }

    fn key_of(&self, dir: &Path) -> String {
        to_logical(dir.strip_prefix(&self.root).unwrap_or(dir))
    }

    /// Convert a filesystem path into a logical root-relative key.
    ///
    /// Relative paths are taken as already relative to the root. Absolute
    /// paths outside the root yield `None`.
    pub fn relative(&self, path: &Path) -> Option<String> {
        if path.is_relative() {
            return Some(to_logical(path));
        }
        if let Ok(rel) = path.strip_prefix(&self.root) {
            return Some(to_logical(rel));
        }
        // Watcher paths may differ from the root by symlinks (e.g. /tmp on macOS)
        let resolved = resolve(path);
        resolved.strip_prefix(&self.root).ok().map(to_logical)
    }

    /// Absolute filesystem path of a logical root-relative key.
    pub fn absolute(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

/// Canonicalize a path that may no longer exist.
///
/// Deleted files cannot be canonicalized, so fall back to the canonical
/// parent joined with the file name.
pub fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
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
    fn test_keys() {
        let paths = paths();
        assert_eq!(paths.content_key(), "content");
        assert_eq!(paths.layouts_key(), "layouts");
        assert_eq!(paths.static_key(), "static");
        assert_eq!(paths.output_key(), "output");
    }

    #[test]
    fn test_relative_absolute_under_root() {
        let paths = paths();
        let rel = paths.relative(Path::new("/site/content/articles/hello.md"));
        assert_eq!(rel.as_deref(), Some("content/articles/hello.md"));
    }

    #[test]
    fn test_relative_outside_root() {
        let paths = paths();
        assert_eq!(paths.relative(Path::new("/elsewhere/content/a.md")), None);
    }

    #[test]
    fn test_relative_already_relative() {
        let paths = paths();
        let rel = paths.relative(Path::new("layouts/basic.html"));
        assert_eq!(rel.as_deref(), Some("layouts/basic.html"));
    }

    #[test]
    fn test_absolute_roundtrip() {
        let paths = paths();
        let abs = paths.absolute("content/articles/hello.md");
        assert_eq!(abs, Path::new("/site/content/articles/hello.md"));
    }

    #[test]
    fn test_nested_directory_keys() {
        let paths = SitePaths::new(
            Path::new("/site"),
            Path::new("src/pages"),
            Path::new("layouts"),
            Path::new("static"),
            Path::new("output"),
        );
        assert_eq!(paths.content_key(), "src/pages");
    }
}
