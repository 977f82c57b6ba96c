//! glaze - a small static site generator with dependency-aware rebuilds.

mod assets;
mod cli;
mod config;
mod data;
mod feed;
mod init;
mod logger;
mod reactor;
mod render;
mod serve;
mod site;
mod utils;
mod watch;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use reactor::ChangeReactor;
use serve::serve_site;
use site::Site;
use std::path::Path;
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::set_verbose(cli.debug);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Init { force, .. } => new_site(&config, *force),
        Commands::Build => build_site(config, false).map(|_| ()),
        Commands::Watch => watch_for_changes_blocking(ChangeReactor::new(build_site(config, false)?)),
        Commands::Serve { .. } => serve_site(build_site(config, true)?),
    }
}

/// Load and validate configuration from CLI arguments.
///
/// The config file is optional; a missing one means defaults.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.is_file() && !cli.is_init() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    if let Commands::Init { force, .. } = &cli.command {
        if !force && config.config_path.exists() {
            bail!("Config file already exists. Remove it manually or use `glaze init --force`.");
        }
        return Ok(config);
    }

    config.validate()?;
    Ok(config)
}

/// Open the project and write a full build. Preview builds get the
/// live reload script.
fn build_site(config: SiteConfig, preview: bool) -> Result<Site> {
    let mut site = Site::open(config, preview)?;
    site.build()?;
    Ok(site)
}
