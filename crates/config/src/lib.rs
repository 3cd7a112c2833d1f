#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for apkolock
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/apkolock/config.toml)
//! - Environment variables
//! - CLI flags
//!
//! It also folds the provider defaults into individual image
//! configurations, see [`merge_image_config`].

pub mod constants;
mod merge;
pub mod provider;
pub mod sections;

pub use sections::{GeneralConfig, NetworkConfig};
pub use merge::{merge_image_config, ImageRequest, MergedConfig};
pub use provider::ProviderConfig;

use apkolock_errors::{ConfigError, Error};
use apkolock_types::{Arch, ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Directory for JSON debug logs
    #[must_use]
    pub fn log_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(constants::APP_DIR)
            .join(constants::LOGS_DIR)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidLayering` for an unusable default layering
    /// and `ConfigError::InvalidValue` for a backoff factor below 1.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(layering) = &self.provider.default_layering {
            layering.validate()?;
        }
        let factor = self.network.backoff_factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "network.backoff_factor".to_string(),
                value: factor.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(output) = env_var("OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => return Err(invalid_env("OUTPUT", output)),
            };
        }

        if let Some(color) = env_var("COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => return Err(invalid_env("COLOR", color)),
            };
        }

        if let Some(archs) = env_var("ARCHS") {
            self.provider.default_archs = Arch::parse_all(split_list(&archs));
        }

        if let Some(packages) = env_var("EXTRA_PACKAGES") {
            self.provider.extra_packages = split_list(&packages).map(String::from).collect();
        }

        if let Some(out_dir) = env_var("OUT_DIR") {
            self.general.out_dir = Some(PathBuf::from(out_dir));
        }

        if let Some(disable) = env_var("DISABLE_VERSION_TAGS") {
            self.general.disable_version_tags = match disable.as_str() {
                "" | "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(invalid_env("DISABLE_VERSION_TAGS", disable)),
            };
        }

        Ok(())
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}{suffix}", constants::ENV_PREFIX)).ok()
}

fn invalid_env(suffix: &str, value: String) -> Error {
    ConfigError::InvalidValue {
        field: format!("{}{suffix}", constants::ENV_PREFIX),
        value,
    }
    .into()
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
