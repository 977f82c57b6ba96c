//! `[base]` section configuration.
//!
//! Site-wide information exposed to templates and used as feed defaults.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in glaze.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Site"
/// url = "https://example.com"
/// author = "a smart person"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, used as the default feed title.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Site description, used as the default feed description.
    #[serde(default)]
    pub description: String,

    /// Absolute base URL used for feed links.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Author name for feed items.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// BCP 47 language code (e.g., "en-US").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Cakes"
            description = "All about cakes"
            url = "https://cakes.example.com"
            author = "Baker"
            language = "fr-FR"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Cakes");
        assert_eq!(config.base.description, "All about cakes");
        assert_eq!(config.base.url.as_deref(), Some("https://cakes.example.com"));
        assert_eq!(config.base.author, "Baker");
        assert_eq!(config.base.language, "fr-FR");
    }

    #[test]
    fn test_base_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]").unwrap();

        assert_eq!(config.base.title, "My Site");
        assert_eq!(config.base.author, "<YOUR_NAME>");
        assert_eq!(config.base.language, "en-US");
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.description, "");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }
}
