//! Rendering collaborators: Markdown conversion, Jinja templates and the
//! immutable context every page is rendered against.

pub mod context;
pub mod markdown;
pub mod template;

pub use context::RenderContext;
pub use template::{Renderer, referenced_templates};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render `{0}` before its metadata is parsed")]
    NotParsed(String),

    #[error("failed to render template `{id}`")]
    Template {
        id: String,
        #[source]
        source: minijinja::Error,
    },
}
