//! The immutable bundle every page is rendered against.
//!
//! Pages never hold a reference to the site. Instead a render pass builds a
//! [`RenderContext`] from a snapshot of the templates and the page index,
//! and templates reach the index through the `site` object:
//!
//! ```jinja
//! {% for page in site.pages(path="articles/", order="-date", limit=5) %}
//!   <a href="{{ page.url }}">{{ page.title }}</a>
//! {% endfor %}
//! {{ site.tags() | join(", ") }}
//! {{ site.feed(path="articles/", order="-date") }}
//! ```

use super::{RenderError, Renderer};
use crate::config::{BaseConfig, MarkdownConfig, SiteConfig};
use crate::data::Templates;
use crate::feed::{FeedChannel, render_feed};
use crate::site::{Page, PageQuery, collect_tags};
use minijinja::value::{Kwargs, Object, from_args};
use minijinja::{Error, ErrorKind, State, Value, context};
use std::sync::Arc;

/// Polling reload script injected through `{{ livejs }}` in preview mode.
const LIVERELOAD_JS: &str = include_str!("../embed/serve/livereload.js");

/// Everything a page render needs besides the page itself.
#[derive(Debug)]
pub struct RenderContext {
    renderer: Renderer,
    site: Value,
    markdown: MarkdownConfig,
    livejs: String,
}

impl RenderContext {
    /// Snapshot templates and pages for one render pass.
    pub fn new(templates: Templates, pages: Vec<Page>, config: &SiteConfig, preview: bool) -> Self {
        let site = SiteObject {
            pages,
            base: config.base.clone(),
            markdown: config.build.markdown.clone(),
        };
        let livejs = if preview && config.serve.livereload {
            format!("<script>{LIVERELOAD_JS}</script>")
        } else {
            String::new()
        };

        Self {
            renderer: Renderer::new(templates),
            site: Value::from_object(site),
            markdown: config.build.markdown.clone(),
            livejs,
        }
    }

    pub fn markdown(&self) -> &MarkdownConfig {
        &self.markdown
    }

    pub fn default_layout(&self) -> &str {
        &self.markdown.default_layout
    }

    /// Render a template with a page's fields plus `site` and `livejs`.
    pub fn render(&self, id: &str, page: &Page) -> Result<String, RenderError> {
        let ctx = context! {
            site => self.site.clone(),
            livejs => self.livejs.as_str(),
            ..Value::from_serialize(page)
        };
        self.renderer.render(id, ctx)
    }
}

/// Read-only view of the page index exposed to templates as `site`.
#[derive(Debug)]
pub struct SiteObject {
    pages: Vec<Page>,
    base: BaseConfig,
    markdown: MarkdownConfig,
}

impl SiteObject {
    fn query(kwargs: &Kwargs) -> Result<PageQuery, Error> {
        let limit: Option<i64> = kwargs.get("limit")?;
        Ok(PageQuery {
            path: kwargs.get("path")?,
            tag: kwargs.get("tag")?,
            limit: limit.and_then(|l| usize::try_from(l).ok()).unwrap_or(0),
            order: kwargs.get("order")?,
        })
    }

    fn select(&self, query: &PageQuery) -> Result<Vec<&Page>, Error> {
        query
            .select(&self.pages)
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
    }
}

impl Object for SiteObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let value = match key.as_str()? {
            "title" => &self.base.title,
            "description" => &self.base.description,
            "author" => &self.base.author,
            "language" => &self.base.language,
            "url" => return Some(Value::from(self.base.url.clone())),
            _ => return None,
        };
        Some(Value::from(value.as_str()))
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "pages" => {
                let (kwargs,): (Kwargs,) = from_args(args)?;
                let query = Self::query(&kwargs)?;
                kwargs.assert_all_used()?;
                Ok(Value::from_serialize(self.select(&query)?))
            }
            "tags" => {
                if !args.is_empty() {
                    return Err(Error::new(
                        ErrorKind::TooManyArguments,
                        "site.tags() takes no arguments",
                    ));
                }
                Ok(Value::from_serialize(collect_tags(&self.pages)))
            }
            "feed" => {
                let (kwargs,): (Kwargs,) = from_args(args)?;
                let query = Self::query(&kwargs)?;
                let channel = FeedChannel {
                    title: kwargs.get("title")?,
                    link: kwargs.get("link")?,
                    description: kwargs.get("description")?,
                };
                kwargs.assert_all_used()?;

                let pages = self.select(&query)?;
                let xml = render_feed(&pages, &channel, &self.base, &self.markdown)
                    .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("{e:#}")))?;
                Ok(Value::from_safe_string(xml))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("site has no method named {method}"),
            )),
        }
    }
}
