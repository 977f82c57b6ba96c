//! Read-through cache of source files.
//!
//! Holds the raw text of every content and layout file, keyed by logical
//! root-relative path, plus a mirror keyed by template identifier that the
//! renderer loads templates from and the dependency resolver analyzes.
//!
//! # Key spaces
//!
//! ```text
//! files                                   templates
//! ─────────────────────────────────────   ──────────────────────────
//! content/index.html            ───────►  index.html
//! content/articles/hello.md               (Markdown is not a template)
//! layouts/basic.html            ───────►  basic.html
//! ```
//!
//! Content templates are mirrored without their metadata block, which must
//! never reach the rendered output. Layouts are mirrored verbatim.
//!
//! The template map is handed to the renderer as an `Arc` snapshot and is
//! copied on write, so a render pass always sees one consistent set of
//! templates even while the store changes.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use thiserror::Error;

use crate::assets::collect_all_files;
use crate::config::SitePaths;
use crate::debug;
use crate::site::meta::split_front_matter;
use crate::utils::path::{relative_to, split_ext, to_logical};

/// Extensions treated as Markdown (converted, never used as templates).
pub const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown"];

/// Snapshot of template identifier → raw template source.
pub type Templates = Arc<BTreeMap<String, String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("`{0}` is not in the content cache")]
    Missing(String),
}

/// Returns true if a logical path has a Markdown extension.
pub fn is_markdown(path: &str) -> bool {
    let name = crate::utils::path::basename(path);
    MARKDOWN_EXTENSIONS.contains(&split_ext(name).1)
}

/// In-memory cache of raw source files.
#[derive(Debug, Clone)]
pub struct ContentStore {
    paths: SitePaths,
    content_key: String,
    layouts_key: String,
    files: BTreeMap<String, String>,
    templates: Templates,
}

impl ContentStore {
    /// Create an empty store for a project layout.
    pub fn new(paths: SitePaths) -> Self {
        Self {
            content_key: paths.content_key(),
            layouts_key: paths.layouts_key(),
            paths,
            files: BTreeMap::new(),
            templates: Arc::default(),
        }
    }

    /// Read fresh data from disk without storing it in the cache.
    ///
    /// Missing files (and directories) yield `None`.
    pub fn peek(&self, path: &str) -> Option<String> {
        let file = self.paths.absolute(path);
        if !file.is_file() {
            return None;
        }
        fs::read_to_string(&file).ok()
    }

    /// Read fresh data from disk and store it in the cache.
    pub fn read(&mut self, path: &str) -> Option<String> {
        let content = self.peek(path)?;
        self.set(path, content.clone());
        Some(content)
    }

    /// Overwrite a cached file, mirroring templates into the template map.
    pub fn set(&mut self, path: &str, content: String) {
        if let Some(id) = self.template_id(path) {
            let source = if relative_to(path, &self.content_key).is_some() {
                split_front_matter(&content).1.to_owned()
            } else {
                content.clone()
            };
            Arc::make_mut(&mut self.templates).insert(id, source);
        }
        self.files.insert(path.to_owned(), content);
    }

    /// Cache-only lookup.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Remove a cached file and its template mirror.
    ///
    /// Deleting a key that is not cached is a caller bug and fails loudly.
    pub fn delete(&mut self, path: &str) -> Result<String, StoreError> {
        let content = self
            .files
            .remove(path)
            .ok_or_else(|| StoreError::Missing(path.to_owned()))?;
        if let Some(id) = self.template_id(path) {
            Arc::make_mut(&mut self.templates).remove(&id);
        }
        Ok(content)
    }

    /// Move a cached file. No-op when `old` is not cached.
    #[cfg(test)]
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let Some(content) = self.files.get(old).cloned() else {
            return Ok(());
        };
        self.set(new, content);
        self.delete(old)?;
        Ok(())
    }

    /// Populate the cache from the content and layout trees.
    ///
    /// Returns the number of files read.
    pub fn warm(&mut self) -> usize {
        let dirs = [self.paths.content.clone(), self.paths.layouts.clone()];
        let mut count = 0;
        for dir in dirs {
            for key in self.list_files(&dir) {
                if self.read(&key).is_some() {
                    count += 1;
                }
            }
        }
        debug!("store"; "warmed {} files", count);
        count
    }

    /// Logical keys of all files below a directory, sorted.
    fn list_files(&self, dir: &std::path::Path) -> Vec<String> {
        collect_all_files(dir)
            .iter()
            .filter_map(|file| file.strip_prefix(&self.paths.root).ok())
            .map(to_logical)
            .collect()
    }

    /// Template identifier for a cached path, if it is a template.
    ///
    /// Content files are templates unless they are Markdown; every layout
    /// file is a template.
    pub fn template_id(&self, path: &str) -> Option<String> {
        if let Some(id) = relative_to(path, &self.content_key) {
            return (!id.is_empty() && !is_markdown(&id)).then_some(id);
        }
        relative_to(path, &self.layouts_key).filter(|id| !id.is_empty())
    }

    /// All cached keys, in order.
    #[cfg(test)]
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Cached keys strictly below a directory key, in order.
    pub fn keys_under(&self, dir: &str) -> Vec<String> {
        self.files
            .keys()
            .filter(|key| relative_to(key, dir).is_some_and(|rel| !rel.is_empty()))
            .cloned()
            .collect()
    }

    /// Cached keys below the content directory, in order.
    pub fn content_files(&self) -> impl Iterator<Item = &str> {
        self.files
            .keys()
            .filter(|key| relative_to(key, &self.content_key).is_some_and(|rel| !rel.is_empty()))
            .map(String::as_str)
    }

    /// Current template snapshot.
    pub fn templates(&self) -> Templates {
        Arc::clone(&self.templates)
    }
}
