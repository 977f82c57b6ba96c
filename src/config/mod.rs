//! Site configuration management for `glaze.toml`.
//!
//! The config file is optional: a project with only `content/` and
//! `layouts/` builds with the defaults below.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Site metadata (title, url, author)             |
//! | `[build]`   | Directory layout and Markdown options          |
//! | `[serve]`   | Preview server (port, interface, watch)        |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Site"
//! url = "https://example.com"
//!
//! [build]
//! output = "public"
//!
//! [build.markdown]
//! default_layout = "post.html"
//!
//! [serve]
//! port = 8000
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod paths;
mod serve;

pub use base::BaseConfig;
pub use build::MarkdownConfig;
pub use paths::SitePaths;

use build::BuildConfig;
use error::ConfigError;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing glaze.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Preview server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Resolved project directories.
    pub fn paths(&self) -> SitePaths {
        SitePaths::new(
            self.get_root(),
            &self.build.content,
            &self.build.layouts,
            &self.build.static_dir,
            &self.build.output,
        )
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = match &cli.command {
            Commands::Init { path: Some(path), .. } => cli
                .root
                .as_deref()
                .unwrap_or_else(|| self.get_root())
                .join(path),
            _ => cli
                .root
                .clone()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };

        let root = Self::normalize_path(&root);
        self.set_root(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        if let Commands::Serve {
            interface,
            port,
            watch,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate the directory layout.
    ///
    /// Every directory must be a plain relative path below the root, and the
    /// output directory must not overlap any source directory, otherwise
    /// written pages would be picked up as changes.
    pub fn validate(&self) -> Result<()> {
        let dirs = [
            ("[build.content]", &self.build.content),
            ("[build.layouts]", &self.build.layouts),
            ("[build.static]", &self.build.static_dir),
            ("[build.output]", &self.build.output),
        ];

        for (field, dir) in dirs {
            let escapes = dir
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir));
            if dir.as_os_str().is_empty() || escapes {
                bail!(ConfigError::Validation(format!(
                    "{field} must be a relative path inside the project root"
                )));
            }
        }

        let output = &self.build.output;
        for (field, dir) in &dirs[..3] {
            if output.starts_with(dir) || dir.starts_with(output) {
                bail!(ConfigError::Validation(format!(
                    "[build.output] overlaps {field}"
                )));
            }
        }

        if self.build.markdown.default_layout.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.markdown.default_layout] must not be empty".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "Cakes"
            [build]
            output = "public"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "Cakes");
        assert_eq!(config.build.output, PathBuf::from("public"));
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[base\ntitle = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root_and_paths() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));

        let paths = config.paths();
        assert_eq!(paths.root, Path::new("/custom/path"));
        assert_eq!(paths.content, Path::new("/custom/path/content"));
        assert_eq!(paths.output, Path::new("/custom/path/output"));
    }

    #[test]
    fn test_validate_default_ok() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_output_inside_content() {
        let config = SiteConfig::from_str(
            r#"
            [build]
            output = "content/out"
        "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("overlaps"));
    }

    #[test]
    fn test_validate_rejects_escaping_dir() {
        let config = SiteConfig::from_str(
            r#"
            [build]
            layouts = "../shared"
        "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SiteConfig::from_str(
            r#"
            [deploy]
            provider = "github"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let content = toml::to_string_pretty(&SiteConfig::default()).unwrap();
        let config = SiteConfig::from_str(&content).unwrap();
        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.serve.port, 8000);
    }
}
