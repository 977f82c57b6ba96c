//! The site index: every page of a project, keyed by content-relative path.
//!
//! # Project Layout
//!
//! ```text
//! root/
//! ├── content/    pages; Markdown and templates that produce output
//! ├── layouts/    shared templates, no output of their own
//! ├── static/     copied verbatim
//! └── output/     build target
//! ```
//!
//! # Build
//!
//! ```text
//! clean_output() → get_pages() → write every page → copy static
//!                      │
//!                      ├── parse all cached content files
//!                      └── render each against a snapshot of the full index
//! ```
//!
//! Incremental rebuilds go through [`Site::render_page`] and
//! [`Site::render_dependents`] instead (see `reactor.rs`).

mod deps;
pub mod meta;
mod page;
mod query;

pub use page::Page;
pub use query::{PageQuery, collect_tags};

use crate::assets::copy_all_static;
use crate::config::{SiteConfig, SitePaths};
use crate::data::ContentStore;
use crate::render::RenderContext;
use crate::utils::path::{join, relative_to};
use crate::{debug, log};
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Counts reported after a full build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub pages: usize,
    pub static_files: usize,
}

/// Output files touched by [`Site::render_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub target: PathBuf,
    /// Output at the page's previous target, deleted after a slug change
    pub stale: Option<PathBuf>,
}

/// A project: its cached sources and the pages derived from them.
#[derive(Debug)]
pub struct Site {
    config: SiteConfig,
    paths: SitePaths,
    preview: bool,
    store: ContentStore,
    pagedata: BTreeMap<String, Page>,
}

impl Site {
    /// Resolve the project layout, warm the cache and index all pages.
    ///
    /// In preview mode pages get the live reload script.
    pub fn open(config: SiteConfig, preview: bool) -> Result<Self> {
        let paths = config.paths();
        let mut store = ContentStore::new(paths.clone());
        let cached = store.warm();
        debug!("site"; "cached {cached} source files from {}", paths.root.display());

        let mut site = Self {
            config,
            paths,
            preview,
            store,
            pagedata: BTreeMap::new(),
        };
        site.get_pages()?;
        Ok(site)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    pub fn page(&self, filepath: &str) -> Option<&Page> {
        self.pagedata.get(filepath)
    }

    /// All indexed pages, ordered by filepath.
    pub fn pagedata(&self) -> &BTreeMap<String, Page> {
        &self.pagedata
    }

    /// Content-relative path of a cache key (`content/a.md` → `a.md`).
    pub fn content_id(&self, key: &str) -> Option<String> {
        relative_to(key, &self.paths.content_key()).filter(|id| !id.is_empty())
    }

    /// Layout-relative path of a cache key (`layouts/basic.html` → `basic.html`).
    pub fn layout_id(&self, key: &str) -> Option<String> {
        relative_to(key, &self.paths.layouts_key()).filter(|id| !id.is_empty())
    }

    /// Snapshot the current templates and index for a render pass.
    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(
            self.store.templates(),
            self.pagedata.values().cloned().collect(),
            &self.config,
            self.preview,
        )
    }

    /// Parse every cached content file that still exists, then render each
    /// page against the complete index. Replaces the index wholesale.
    pub fn get_pages(&mut self) -> Result<usize> {
        let mut pages = BTreeMap::new();

        for key in self.store.content_files() {
            if !self.paths.absolute(key).is_file() {
                continue;
            }
            let (Some(filepath), Some(text)) = (self.content_id(key), self.store.get(key)) else {
                continue;
            };
            debug!("site"; "parsing {filepath}");
            let page = Page::parse_string(&filepath, text);
            pages.insert(page.filepath.clone(), page);
        }

        self.pagedata = pages;
        let ctx = self.render_context();
        for (filepath, page) in &mut self.pagedata {
            page.render(&ctx)
                .with_context(|| format!("failed to render {filepath}"))?;
        }

        Ok(self.pagedata.len())
    }

    /// Query the index; see [`PageQuery`].
    #[cfg(test)]
    pub fn pages(&self, query: &PageQuery) -> Result<Vec<&Page>, query::QueryError> {
        query.select(self.pagedata.values())
    }

    /// Sorted union of all page tags.
    pub fn tags(&self) -> Vec<String> {
        collect_tags(self.pagedata.values())
    }

    /// Clean the output directory and rebuild everything.
    pub fn build(&mut self) -> Result<BuildSummary> {
        self.clean_output()?;
        let pages = self.get_pages()?;

        for page in self.pagedata.values() {
            page.write(&self.paths.output)?;
        }
        let static_files = copy_all_static(&self.paths)?;

        log!("build"; "{pages} pages, {} tags, {static_files} static files", self.tags().len());
        Ok(BuildSummary {
            pages,
            static_files,
        })
    }

    /// Delete the output directory. Succeeds if there is nothing to delete.
    pub fn clean_output(&self) -> Result<()> {
        let output = &self.paths.output;
        if output.is_dir() {
            fs::remove_dir_all(output)
                .with_context(|| format!("failed to clean {}", output.display()))?;
        }
        Ok(())
    }

    /// Parse a content file from the cache, render it to disk and index it.
    ///
    /// When the page already had a different target (its slug changed), the
    /// old output is deleted.
    pub fn render_page(&mut self, filepath: &str) -> Result<RenderedPage> {
        let key = join(&[&self.paths.content_key(), filepath]);
        let text = self
            .store
            .get(&key)
            .ok_or_else(|| anyhow!("{key} is not cached"))?;

        let page = Page::parse_string(filepath, text);
        let filepath = page.filepath.clone();
        let new_target = page.target()?;
        let old_target = self
            .pagedata
            .insert(filepath.clone(), page)
            .and_then(|old| old.target().ok())
            .filter(|old| *old != new_target);

        let ctx = self.render_context();
        let page = self
            .pagedata
            .get_mut(&filepath)
            .ok_or_else(|| anyhow!("{filepath} vanished from the index"))?;
        let target = page
            .render_to_disk(&ctx, &self.paths.output)
            .with_context(|| format!("failed to render {filepath}"))?;

        let stale = match old_target {
            Some(old) => self.remove_output(&old)?,
            None => None,
        };
        Ok(RenderedPage { target, stale })
    }

    /// Drop a page from the index and delete its output.
    ///
    /// Returns the removed output file, if the page was indexed. A clean-URL
    /// directory left empty by the removal is deleted too.
    pub fn remove_page(&mut self, filepath: &str) -> Result<Option<PathBuf>> {
        let Some(page) = self.pagedata.remove(filepath) else {
            return Ok(None);
        };
        self.remove_output(&page.target()?)
    }

    /// Delete one output file, then its parent if that left it empty.
    fn remove_output(&self, target: &str) -> Result<Option<PathBuf>> {
        let target = self.paths.output.join(target);
        if !target.is_file() {
            return Ok(None);
        }

        fs::remove_file(&target).with_context(|| format!("failed to remove {}", target.display()))?;
        if let Some(parent) = target.parent()
            && parent != self.paths.output
            && fs::read_dir(parent).is_ok_and(|mut entries| entries.next().is_none())
        {
            fs::remove_dir(parent).ok();
        }
        Ok(Some(target))
    }
}
