//! Static file handling.
//!
//! Everything below the static directory is copied verbatim to the same
//! relative path in the output directory:
//!
//! `static/css/site.css` → `output/css/site.css`

use crate::config::SitePaths;
use crate::log;
use crate::utils::path::{relative_to, to_logical};
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively, sorted.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Output path of a static file, given its logical root-relative key.
pub fn static_target(key: &str, paths: &SitePaths) -> Result<PathBuf> {
    let rel = relative_to(key, &paths.static_key())
        .filter(|rel| !rel.is_empty())
        .ok_or_else(|| anyhow!("{key} is not below the static directory"))?;
    Ok(rel
        .split('/')
        .fold(paths.output.clone(), |acc, part| acc.join(part)))
}

/// Copy one static file into the output directory.
pub fn copy_static(key: &str, paths: &SitePaths) -> Result<PathBuf> {
    let source = paths.absolute(key);
    let target = static_target(key, paths)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::copy(&source, &target)
        .with_context(|| format!("failed to copy {} to {}", source.display(), target.display()))?;
    Ok(target)
}

/// Remove the copy of a deleted static file. Missing copies are fine.
pub fn remove_static(key: &str, paths: &SitePaths) -> Result<Option<PathBuf>> {
    let target = static_target(key, paths)?;
    if !target.is_file() {
        return Ok(None);
    }
    fs::remove_file(&target).with_context(|| format!("failed to remove {}", target.display()))?;
    Ok(Some(target))
}

/// Copy the whole static tree. Returns the number of files copied.
pub fn copy_all_static(paths: &SitePaths) -> Result<usize> {
    let mut count = 0;
    for file in collect_all_files(&paths.static_dir) {
        let Ok(rel) = file.strip_prefix(&paths.root) else {
            continue;
        };
        copy_static(&to_logical(rel), paths)?;
        count += 1;
    }
    if count > 0 {
        log!("static"; "copied {count} files");
    }
    Ok(count)
}
