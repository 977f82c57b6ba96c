//! `[serve]` section configuration.
//!
//! Contains preview server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in glaze.toml - preview server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 3000
/// watch = true           # Re-render on file changes
/// livereload = true      # Inject the reload script into pages
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 8000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Enable file watcher for incremental rebuilds.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// Expose the reload script as the `livejs` template variable.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub livereload: bool,
}
