//! A single content file and everything derived from it.
//!
//! ```text
//! Page::new          filepath → folder, slug, ext, url     (no I/O)
//!   │
//! parse_metadata     front matter → date, title, tags, ...  (parsed = true)
//!   │
//! render             body → content (Markdown) → rendered
//!   │
//! render_to_disk     rendered → output/<target>
//! ```

use super::meta::{self, RECOGNIZED, split_front_matter};
use crate::data::MARKDOWN_EXTENSIONS;
use crate::render::{RenderContext, RenderError, markdown};
use crate::utils::path::{basename, dirname, join, normalize, split_ext};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions that get a clean URL (`/folder/slug/` → `folder/slug/index.html`).
const CLEAN_URL_EXTENSIONS: &[&str] = &[".html", ".md", ".markdown"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("target of `{0}` requested before its metadata was parsed")]
    NotParsed(String),
}

/// A discrete piece of content that ends up in the output directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Path relative to the content directory; unique key in the site index.
    pub filepath: String,
    /// Leading part of the URL.
    pub folder: String,
    /// Final part of the URL; empty for `index` pages.
    pub slug: String,
    /// Extension with its leading dot, possibly empty.
    pub ext: String,
    pub url: String,

    pub date: Option<String>,
    pub title: Option<String>,
    /// Layout override for Markdown pages.
    pub template: Option<String>,
    pub tags: Vec<String>,

    /// Raw body, set when the page is parsed.
    pub body: Option<String>,
    /// Body converted to HTML (Markdown pages only).
    pub content: Option<String>,
    #[serde(skip)]
    pub rendered: Option<String>,

    pub parsed: bool,
}

impl Page {
    /// Derive identity and URL from a content-relative path.
    pub fn new(filepath: &str) -> Self {
        let filepath = normalize(filepath);
        let folder = dirname(&filepath).to_owned();
        let (stem, ext) = split_ext(basename(&filepath));
        let slug = if stem == "index" { "" } else { stem }.to_owned();
        let ext = ext.to_owned();

        let mut page = Self {
            filepath,
            folder,
            slug,
            ext,
            url: String::new(),
            date: None,
            title: None,
            template: None,
            tags: Vec::new(),
            body: None,
            content: None,
            rendered: None,
            parsed: false,
        };
        page.url = page.compute_url();
        page
    }

    /// Split raw file text into metadata and body.
    pub fn parse_string(filepath: &str, text: &str) -> Self {
        let mut page = Self::new(filepath);
        let (metadata, body) = split_front_matter(text);

        match metadata {
            Some(metadata) => page.parse_metadata(metadata),
            None => {
                if page.is_markdown() {
                    log!("warn"; "no metadata in {}, expected `{}` separator", page.filepath, meta::DELIMITER);
                }
                page.parsed = true;
            }
        }

        page.body = Some(body.to_owned());
        page
    }

    /// Apply a metadata block to this page.
    ///
    /// Absent keys leave the current value alone, so `slug` keeps its
    /// filepath-derived default and a re-parse keeps earlier `date`, `title`
    /// and `template` values. `tags` is the exception and resets to empty.
    pub fn parse_metadata(&mut self, text: &str) {
        debug!("page"; "parsing metadata of {}", self.filepath);
        let mut values = meta::parse(text, &self.filepath);

        for key in values.keys().filter(|k| !RECOGNIZED.contains(&k.as_str())) {
            debug!("page"; "{}: ignoring unknown metadata key `{key}`", self.filepath);
        }

        self.tags = values
            .remove("tags")
            .map(|tags| tags.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        if let Some(date) = values.remove("date") {
            self.date = Some(date);
        }
        if let Some(title) = values.remove("title") {
            self.title = Some(title);
        }
        if let Some(template) = values.remove("template") {
            self.template = Some(template).filter(|t| !t.is_empty());
        }
        if let Some(slug) = values.remove("slug") {
            self.slug = slug;
        }

        for (key, missing) in [("date", self.date.is_none()), ("title", self.title.is_none())] {
            if missing {
                log!("warn"; "metadata `{key}` not specified in {}", self.filepath);
            }
        }

        self.url = self.compute_url();
        self.parsed = true;
    }

    pub fn is_markdown(&self) -> bool {
        MARKDOWN_EXTENSIONS.contains(&self.ext.as_str())
    }

    fn has_clean_url(&self) -> bool {
        CLEAN_URL_EXTENSIONS.contains(&self.ext.as_str())
    }

    fn compute_url(&self) -> String {
        if self.has_clean_url() {
            let path = join(&[&self.folder, &self.slug]);
            if path.is_empty() {
                "/".to_owned()
            } else {
                format!("/{path}/")
            }
        } else {
            format!("/{}", join(&[&self.folder, &format!("{}{}", self.slug, self.ext)]))
        }
    }

    /// Output path relative to the output directory.
    ///
    /// Depends on a possibly customized slug, so only valid after parsing.
    pub fn target(&self) -> Result<String, PageError> {
        if !self.parsed {
            return Err(PageError::NotParsed(self.filepath.clone()));
        }
        Ok(if self.has_clean_url() {
            join(&[&self.folder, &self.slug, "index.html"])
        } else {
            join(&[&self.folder, &format!("{}{}", self.slug, self.ext)])
        })
    }

    /// Template that renders this page.
    ///
    /// Markdown pages use their `template` override or the default layout;
    /// every other page is its own template.
    pub fn layout<'a>(&'a self, default_layout: &'a str) -> &'a str {
        if self.is_markdown() {
            self.template.as_deref().unwrap_or(default_layout)
        } else {
            &self.filepath
        }
    }

    /// Render the page and cache the result.
    pub fn render(&mut self, ctx: &RenderContext) -> Result<&str, RenderError> {
        if !self.parsed {
            return Err(RenderError::NotParsed(self.filepath.clone()));
        }
        debug!("page"; "rendering {}", self.filepath);

        if self.is_markdown() {
            let body = self.body.as_deref().unwrap_or_default();
            self.content = Some(markdown::convert(body, ctx.markdown()));
        }

        let id = self.layout(ctx.default_layout()).to_owned();
        let rendered = ctx.render(&id, self)?;
        Ok(self.rendered.insert(rendered).as_str())
    }

    /// Render the page and write it below `output_dir`.
    pub fn render_to_disk(&mut self, ctx: &RenderContext, output_dir: &Path) -> Result<PathBuf> {
        self.render(ctx)?;
        self.write(output_dir)
    }

    /// Write the cached render output below `output_dir`.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let target = self.target()?;
        let path = output_dir.join(&target);
        let rendered = self
            .rendered
            .as_deref()
            .with_context(|| format!("{} has not been rendered", self.filepath))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("page"; "wrote {target}");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(templates: &[(&str, &str)], pages: Vec<Page>) -> RenderContext {
        let templates: BTreeMap<_, _> = templates
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RenderContext::new(Arc::new(templates), pages, &SiteConfig::default(), false)
    }

    #[test]
    fn test_new_derives_identity() {
        let page = Page::new("articles/hello.md");
        assert_eq!(page.folder, "articles");
        assert_eq!(page.slug, "hello");
        assert_eq!(page.ext, ".md");
        assert_eq!(page.url, "/articles/hello/");
        assert!(!page.parsed);
    }

    #[test]
    fn test_index_slug_is_empty() {
        let page = Page::new("index.html");
        assert_eq!(page.slug, "");
        assert_eq!(page.url, "/");

        let page = Page::new("articles/index.md");
        assert_eq!(page.slug, "");
        assert_eq!(page.url, "/articles/");
        assert!(page.url.ends_with('/'));
    }

    #[test]
    fn test_non_html_keeps_filename() {
        let mut page = Page::parse_string("feeds/atom.xml", "<feed/>");
        assert_eq!(page.url, "/feeds/atom.xml");
        assert_eq!(page.target().unwrap(), "feeds/atom.xml");

        page.parsed = false;
        assert!(page.target().is_err());
    }

    #[test]
    fn test_target_before_parse_fails() {
        let page = Page::new("articles/hello.md");
        assert_eq!(
            page.target(),
            Err(PageError::NotParsed("articles/hello.md".into()))
        );
    }

    #[test]
    fn test_targets() {
        let page = Page::parse_string("index.html", "hi");
        assert_eq!(page.target().unwrap(), "index.html");

        let page = Page::parse_string("articles/hello.md", "title = x\n++++\nhi");
        assert_eq!(page.target().unwrap(), "articles/hello/index.html");
    }

    #[test]
    fn test_parse_hello_world() {
        let text = "title = Hello World\ndate = 2024-01-01\ntags = cake baking\n++++\n\nWelcome!\n";
        let page = Page::parse_string("articles/hello.md", text);

        assert!(page.parsed);
        assert_eq!(page.title.as_deref(), Some("Hello World"));
        assert_eq!(page.date.as_deref(), Some("2024-01-01"));
        assert_eq!(page.tags, vec!["cake", "baking"]);
        assert_eq!(page.template, None);
        assert_eq!(page.body.as_deref(), Some("Welcome!"));
        assert_eq!(page.target().unwrap(), "articles/hello/index.html");
    }

    #[test]
    fn test_parse_without_delimiter() {
        let page = Page::parse_string("notes.md", "  only a body  ");
        assert!(page.parsed);
        assert_eq!(page.body.as_deref(), Some("only a body"));
        assert_eq!(page.title, None);
        assert!(page.tags.is_empty());
    }

    #[test]
    fn test_custom_slug_changes_url_and_target() {
        let page = Page::parse_string("articles/hello.md", "title = x\nslug = greetings\n++++\nhi");
        assert_eq!(page.url, "/articles/greetings/");
        assert_eq!(page.target().unwrap(), "articles/greetings/index.html");
    }

    #[test]
    fn test_absent_slug_keeps_default() {
        let mut page = Page::new("articles/hello.md");
        page.parse_metadata("title = x");
        assert_eq!(page.slug, "hello");
    }

    #[test]
    fn test_reparse_keeps_absent_fields() {
        let mut page = Page::new("a.md");
        page.parse_metadata("title = x\ntemplate = post.html\ntags = t\nslug = first");
        page.parse_metadata("date = 2024-01-01");
        assert_eq!(page.title.as_deref(), Some("x"));
        assert_eq!(page.template.as_deref(), Some("post.html"));
        assert_eq!(page.slug, "first");
        assert!(page.tags.is_empty());
        assert_eq!(page.date.as_deref(), Some("2024-01-01"));

        page.parse_metadata("template =");
        assert_eq!(page.template, None);
        assert_eq!(page.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_malformed_line_does_not_corrupt_fields() {
        let page = Page::parse_string("a.md", "title = Kept\nthis line is wrong\ndate = 2024-05-05\n++++\nbody");
        assert_eq!(page.title.as_deref(), Some("Kept"));
        assert_eq!(page.date.as_deref(), Some("2024-05-05"));
    }

    #[test]
    fn test_layout_selection() {
        let page = Page::parse_string("a.md", "template = post.html\n++++\nx");
        assert_eq!(page.layout("markdown.html"), "post.html");

        let page = Page::parse_string("b.md", "title = b\n++++\nx");
        assert_eq!(page.layout("markdown.html"), "markdown.html");

        let page = Page::parse_string("c/index.html", "x");
        assert_eq!(page.layout("markdown.html"), "c/index.html");
    }

    #[test]
    fn test_render_markdown_end_to_end() {
        let page = Page::parse_string(
            "articles/hello.md",
            "title = Hello World\ndate = 2024-01-01\n++++\nHi *there*",
        );
        let ctx = context(
            &[("markdown.html", "<h1>{{ title }}</h1>{{ content }}[{{ livejs }}]")],
            vec![page.clone()],
        );

        let mut page = page;
        let rendered = page.render(&ctx).unwrap().to_owned();
        assert_eq!(rendered, "<h1>Hello World</h1><p>Hi <em>there</em></p>\n[]");
        assert_eq!(page.rendered.as_deref(), Some(rendered.as_str()));
        assert_eq!(page.content.as_deref(), Some("<p>Hi <em>there</em></p>\n"));
    }

    #[test]
    fn test_render_html_page_is_its_own_template() {
        let mut page = Page::parse_string("about.html", "title = About\n++++\n<p>{{ title }} at {{ url }}</p>");
        let ctx = context(
            &[("about.html", "title = About\n++++\n<p>{{ title }} at {{ url }}</p>")],
            vec![],
        );
        assert_eq!(page.render(&ctx).unwrap(), "<p>About at /about/</p>");
        assert_eq!(page.content, None);
    }

    #[test]
    fn test_render_before_parse_fails() {
        let mut page = Page::new("a.md");
        let ctx = context(&[], vec![]);
        assert!(matches!(page.render(&ctx), Err(RenderError::NotParsed(_))));
    }

    #[test]
    fn test_render_to_disk() {
        let dir = TempDir::new().unwrap();
        let mut page = Page::parse_string("articles/hello.md", "title = Hi\n++++\nbody");
        let ctx = context(&[("markdown.html", "{{ title }}")], vec![]);

        let path = page.render_to_disk(&ctx, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("articles/hello/index.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "Hi");
    }
}
