//! `[build]` section configuration.
//!
//! Contains the project directory layout and Markdown options.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in glaze.toml - project layout.
///
/// All directories are relative to the project root and must stay inside it,
/// since change events are classified by which directory they fall under.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"    # Pages (Markdown and templates with output)
/// layouts = "layouts"    # Shared templates, no output of their own
/// static = "static"      # Copied verbatim
/// output = "output"      # Build target
///
/// [build.markdown]
/// default_layout = "markdown.html"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Layout template directory.
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Static files directory, copied as-is into output.
    #[serde(rename = "static", default = "defaults::build::r#static")]
    #[educe(Default = defaults::build::r#static())]
    pub static_dir: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Markdown conversion settings.
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

/// `[build.markdown]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Layout used by Markdown pages without a `template` override.
    #[serde(default = "defaults::build::markdown::default_layout")]
    #[educe(Default = defaults::build::markdown::default_layout())]
    pub default_layout: String,

    /// GitHub-style tables.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub tables: bool,

    /// Footnote references and definitions.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub footnotes: bool,

    /// `~~strikethrough~~`
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub strikethrough: bool,

    /// `- [x]` task lists.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub tasklists: bool,

    /// Curly quotes and dashes.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub smart_punctuation: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.layouts, PathBuf::from("layouts"));
        assert_eq!(config.build.static_dir, PathBuf::from("static"));
        assert_eq!(config.build.output, PathBuf::from("output"));
        assert_eq!(config.build.markdown.default_layout, "markdown.html");
        assert!(config.build.markdown.tables);
        assert!(!config.build.markdown.smart_punctuation);
    }

    #[test]
    fn test_static_key_rename() {
        let config = r#"
            [build]
            static = "public"
            output = "dist"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.static_dir, PathBuf::from("public"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_markdown_partial_override() {
        let config = r#"
            [build.markdown]
            default_layout = "post.html"
            tables = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.markdown.default_layout, "post.html");
        assert!(!config.build.markdown.tables);
        assert!(config.build.markdown.footnotes);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            templates = "templates"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
