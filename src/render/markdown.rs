//! Markdown to HTML conversion.

use crate::config::MarkdownConfig;
use pulldown_cmark::{Options, Parser, html};

/// Parser options enabled by `[build.markdown]`.
pub fn parser_options(config: &MarkdownConfig) -> Options {
    let mut options = Options::empty();
    options.set(Options::ENABLE_TABLES, config.tables);
    options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
    options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
    options.set(Options::ENABLE_TASKLISTS, config.tasklists);
    options.set(Options::ENABLE_SMART_PUNCTUATION, config.smart_punctuation);
    options
}

/// Convert a Markdown body into an HTML fragment.
pub fn convert(text: &str, config: &MarkdownConfig) -> String {
    let parser = Parser::new_ext(text, parser_options(config));
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}
