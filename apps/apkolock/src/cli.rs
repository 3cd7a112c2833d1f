//! Command line interface definition

use clap::{Parser, Subcommand};
use apkolock_types::ColorChoice;
use std::path::PathBuf;

/// apkolock - lock apko package lists across architectures
#[derive(Parser)]
#[command(name = "apkolock")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lock apko image package lists to versions consistent across architectures")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the apkolock log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long = "config", id = "config_file", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an image configuration for every architecture and lock it
    Lock {
        /// Image configuration (apko YAML)
        config: PathBuf,

        /// Recorded per-architecture resolutions (JSON)
        #[arg(long, value_name = "FILE")]
        resolutions: PathBuf,

        /// Additional package for this image only
        #[arg(long = "extra-package", value_name = "PACKAGE")]
        extra_packages: Vec<String>,

        /// Default annotation for this image only
        #[arg(long = "annotation", value_name = "KEY=VALUE")]
        annotations: Vec<String>,

        /// Write configuration snapshots to this directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Print the version tags of a package in a locked configuration
    Tags {
        /// Locked image configuration (YAML or JSON)
        config: PathBuf,

        /// Package whose version drives the tags
        package: String,
    },

    /// Map component configurations onto their version streams
    Streams {
        /// Stream plan with `configs` and `versions` (YAML)
        plan: PathBuf,

        /// Take configurations from previously computed locks (JSON)
        #[arg(long, value_name = "FILE")]
        source: Option<PathBuf>,

        /// Write resolved and locked configurations to this directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

impl Commands {
    /// Get command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Lock { .. } => "lock",
            Commands::Tags { .. } => "tags",
            Commands::Streams { .. } => "streams",
            Commands::Version => "version",
        }
    }
}
