//! Declarative image configuration model
//!
//! Mirrors the apko YAML layout. Parsing is strict: unknown keys are
//! rejected so typos surface instead of silently building a different image.

use crate::Arch;
use apkolock_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The only layering strategy apko supports
pub const LAYERING_STRATEGY_ORIGIN: &str = "origin";

/// Complete image configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfiguration {
    #[serde(default)]
    pub contents: ImageContents,

    #[serde(default, skip_serializing_if = "ImageEntrypoint::is_empty")]
    pub entrypoint: ImageEntrypoint,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cmd: String,

    #[serde(default, rename = "work-dir", skip_serializing_if = "String::is_empty")]
    pub work_dir: String,

    #[serde(default, skip_serializing_if = "ImageAccounts::is_empty")]
    pub accounts: ImageAccounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archs: Vec<Arch>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layering: Option<Layering>,
}

/// Package sources and the package list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageContents {
    /// Repositories only consulted while building, never written to the image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_repositories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyring: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEntrypoint {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
}

impl ImageEntrypoint {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Users, groups and the account the image runs as
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageAccounts {
    #[serde(default, rename = "run-as", skip_serializing_if = "String::is_empty")]
    pub run_as: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<ImageUser>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ImageGroup>,
}

impl ImageAccounts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.run_as.is_empty() && self.users.is_empty() && self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageUser {
    pub username: String,
    pub uid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shell: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homedir: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGroup {
    pub groupname: String,
    pub gid: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// Layer splitting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layering {
    pub strategy: String,
    pub budget: u32,
}

impl Layering {
    /// Check the strategy is supported and the budget allows at least one layer
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidLayering` for any other strategy or a zero budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy != LAYERING_STRATEGY_ORIGIN {
            return Err(ConfigError::InvalidLayering {
                message: format!(
                    "unsupported strategy {:?}, expected {LAYERING_STRATEGY_ORIGIN:?}",
                    self.strategy
                ),
            });
        }
        if self.budget == 0 {
            return Err(ConfigError::InvalidLayering {
                message: "budget must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ImageConfiguration {
    /// Parse YAML, rejecting unknown fields
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the document is not a valid image configuration.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SerializeError` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yml::to_string(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SerializeError` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })
    }

    /// Copy of this configuration with a replacement package list
    #[must_use]
    pub fn with_packages(&self, packages: Vec<String>) -> Self {
        let mut ic = self.clone();
        ic.contents.packages = packages;
        ic
    }
}
