//! Version streams and the component configurations mapped onto them
//!
//! A version stream describes one supported release line of a product
//! (`8.2`, `8.3`, ...) together with its lifecycle metadata. Component
//! configurations are matched to the stream whose version appears in the
//! component name.

use crate::ImageConfiguration;
use apkolock_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle metadata for one release line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionStream {
    pub eol: bool,
    pub eol_date: String,
    pub exists: bool,
    pub fips: bool,
    pub is_latest: bool,
    pub lts: String,
    /// Package whose pinned version drives the image tags
    pub main: String,
    pub release_date: String,
    /// Version fragment matched against component names
    pub version: String,
}

/// Every known stream, keyed by stream name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionStreams {
    /// Preferred stream order; earlier keys win ties between matches
    pub ordered_keys: Vec<String>,
    pub versions: BTreeMap<String, VersionStream>,
}

impl VersionStreams {
    /// The stream a component name belongs to
    ///
    /// A stream matches when its version occurs in `component`. The longest
    /// matching version wins, so `php-8.2-fpm` picks `8.2` over `8`. Equal
    /// lengths fall back to `ordered_keys`, then to the stream name.
    #[must_use]
    pub fn matching(&self, component: &str) -> Option<(&str, &VersionStream)> {
        let rank = |name: &str| {
            self.ordered_keys
                .iter()
                .position(|key| key == name)
                .unwrap_or(usize::MAX)
        };

        self.versions
            .iter()
            .filter(|(_, stream)| component.contains(stream.version.as_str()))
            .min_by(|(a_name, a), (b_name, b)| {
                b.version
                    .len()
                    .cmp(&a.version.len())
                    .then_with(|| rank(a_name).cmp(&rank(b_name)))
                    .then_with(|| a_name.cmp(b_name))
            })
            .map(|(name, stream)| (name.as_str(), stream))
    }
}

/// One component configuration to resolve against the streams
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    pub config: ImageConfiguration,
    /// Locked configuration, when the component has already been locked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<ImageConfiguration>,
    #[serde(default)]
    pub component: String,
    /// Overrides the stream's `main` package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
}

/// Component configurations plus the version streams they map onto
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamPlan {
    #[serde(default)]
    pub configs: BTreeMap<String, ComponentConfig>,
    #[serde(default)]
    pub versions: VersionStreams,
}

impl StreamPlan {
    /// Parse a stream plan from YAML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the document is malformed.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Previously computed image locks, keyed by component
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockSource {
    #[serde(rename = "imageLocks", default)]
    pub image_locks: BTreeMap<String, SourceLock>,
}

/// Locks recorded for one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceLock {
    /// Serialized configurations keyed by role; `index` holds the unified one
    pub configs: BTreeMap<String, String>,
    pub eol: bool,
    pub main: String,
    pub tags: Vec<String>,
    pub latest: bool,
}

#[derive(Deserialize)]
struct IndexDocument {
    #[serde(alias = "Config")]
    config: ImageConfiguration,
}

impl LockSource {
    /// Parse a lock source document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the document is malformed.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

impl SourceLock {
    /// The unified configuration stored under the `index` key
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the entry is missing or does not
    /// hold a `{"config": ...}` document.
    pub fn index_config(&self) -> Result<ImageConfiguration, ConfigError> {
        let raw = self
            .configs
            .get("index")
            .ok_or_else(|| ConfigError::ParseError {
                message: "lock source has no index configuration".to_string(),
            })?;
        let document: IndexDocument =
            serde_json::from_str(raw).map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })?;
        Ok(document.config)
    }
}
