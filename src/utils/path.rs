//! Lexical helpers for logical paths.
//!
//! Cache keys, template identifiers and page filepaths are `/`-separated
//! strings relative to some root (`content/articles/hello.md`,
//! `basic.html`). They never touch the filesystem, so the same key is
//! produced on every platform.

use std::path::{Component, Path};

/// Normalize a logical path lexically.
///
/// Empty and `.` segments are dropped, `..` pops the previous segment.
/// The empty path normalizes to `""`.
///
/// `articles/./hello/` → `articles/hello`
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join logical path segments and normalize the result.
pub fn join(parts: &[&str]) -> String {
    normalize(&parts.join("/"))
}

/// Parent folder of a logical path (`""` for top-level files).
pub fn dirname(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Final segment of a logical path.
pub fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}

/// Split a file name into stem and extension (extension keeps its dot).
///
/// Leading dots are part of the stem: `.htaccess` has no extension.
pub fn split_ext(name: &str) -> (&str, &str) {
    let trimmed = name.trim_start_matches('.');
    let offset = name.len() - trimmed.len();
    match trimmed.rfind('.') {
        Some(idx) => name.split_at(offset + idx),
        None => (name, ""),
    }
}

/// Strip a logical prefix from a path, matching whole segments only.
///
/// `relative_to("content/a.md", "content")` → `Some("a.md")`
/// `relative_to("contents/a.md", "content")` → `None`
pub fn relative_to(path: &str, base: &str) -> Option<String> {
    let path = normalize(path);
    let base = normalize(base);
    if base.is_empty() {
        return Some(path);
    }
    if path == base {
        return Some(String::new());
    }
    path.strip_prefix(&base)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_owned)
}

/// Convert a relative filesystem path into a logical path.
pub fn to_logical(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect();
    normalize(&parts.join("/"))
}
