//! Provider-wide defaults folded into every image configuration

use apkolock_types::{Arch, Layering};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Defaults applied to every image configuration before it is locked
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Runtime repositories added to every configuration
    #[serde(default)]
    pub extra_repositories: Vec<String>,
    /// Repositories consulted only while building
    #[serde(default)]
    pub build_repositories: Vec<String>,
    #[serde(default)]
    pub extra_packages: Vec<String>,
    #[serde(default)]
    pub extra_keyring: Vec<String>,
    /// Used when a configuration declares no architectures
    #[serde(default)]
    pub default_archs: Vec<Arch>,
    /// Lowest-precedence annotations
    #[serde(default)]
    pub default_annotations: BTreeMap<String, String>,
    /// Used when a configuration declares no layering
    #[serde(default)]
    pub default_layering: Option<Layering>,
}
