//! Jinja template rendering and static reference analysis.
//!
//! Templates are loaded lazily from a [`Templates`] snapshot, so a renderer
//! always sees the cache as it was when the render pass started.

use super::RenderError;
use crate::data::Templates;
use minijinja::{AutoEscape, Environment, Value};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Template renderer backed by a snapshot of the content cache.
pub struct Renderer {
    env: Environment<'static>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(templates: Templates) -> Self {
        let mut env = Environment::new();
        // Output is HTML assembled by the site author, never escape it
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_loader(move |id| Ok(templates.get(id).cloned()));
        Self { env }
    }

    /// Render a template by identifier.
    pub fn render(&self, id: &str, ctx: Value) -> Result<String, RenderError> {
        let wrap = |source| RenderError::Template {
            id: id.to_owned(),
            source,
        };
        let template = self.env.get_template(id).map_err(wrap)?;
        template.render(ctx).map_err(wrap)
    }
}

/// Template identifiers referenced by `extends`, `include`, `import` and
/// `from` tags in a template body.
///
/// Only string literals are found. Dynamic references
/// (`{% include page.template %}`) cannot be resolved statically.
pub fn referenced_templates(body: &str) -> BTreeSet<String> {
    static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\{%[-+]?[ \t\r\n]*(?:extends|include|import|from)[ \t\r\n]+(.+?)[ \t\r\n]*[-+]?%\}")
            .unwrap()
    });
    static RE_LITERAL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).unwrap());

    let mut ids = BTreeSet::new();
    for tag in RE_TAG.captures_iter(body) {
        for literal in RE_LITERAL.captures_iter(&tag[1]) {
            if let Some(id) = literal.get(1).or_else(|| literal.get(2)) {
                ids.insert(id.as_str().to_owned());
            }
        }
    }
    ids
}
