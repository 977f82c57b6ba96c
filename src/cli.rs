//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// glaze static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root (default: glaze.toml)
    #[arg(short = 'C', long, default_value = "glaze.toml", global = true)]
    pub config: PathBuf,

    /// Print debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a starter project. The path is created if it does not exist
    Init {
        /// the path of the site directory, relative to `root`
        path: Option<PathBuf>,

        /// Initialize even if the directory is not empty
        #[arg(short, long)]
        force: bool,
    },

    /// Deletes the output directory if there is one and rebuilds the site
    Build,

    /// Build once, then re-render affected pages whenever sources change
    Watch,

    /// Build, watch and serve the output directory with live reload
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}
