//! General and network configuration sections

use apkolock_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
    /// Directory receiving `<id>.pre.apko.json` / `<id>.post.apko.json` snapshots
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default)]
    pub disable_version_tags: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
            out_dir: None,
            disable_version_tags: false,
        }
    }
}

/// Retry policy for registry pushes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Attempts before giving up
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
    /// Multiplier applied to the delay after each failed attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl NetworkConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: 5,
            backoff_factor: 2.0,
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_backoff_factor() -> f64 {
    2.0
}
