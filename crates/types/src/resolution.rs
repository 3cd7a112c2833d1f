//! Per-architecture resolution results

use crate::{Arch, PackageSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One package in a resolved transitive closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    /// Bare capability names this package satisfies besides its own name
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub provides: BTreeSet<String>,
}

impl ResolvedPackage {
    /// Create a resolved package that provides nothing extra
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            provides: BTreeSet::new(),
        }
    }

    /// Add provided capabilities
    #[must_use]
    pub fn with_provides<I, S>(mut self, provides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(provides.into_iter().map(Into::into));
        self
    }
}

/// Full resolution of a package list for one architecture
///
/// The package set is always exactly the key set of the version map, and
/// only packages with a non-empty capability set appear in `provides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchResolution {
    arch: Arch,
    packages: BTreeSet<String>,
    versions: BTreeMap<String, String>,
    provides: BTreeMap<String, BTreeSet<String>>,
}

impl ArchResolution {
    /// Create an empty resolution for an architecture
    #[must_use]
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            packages: BTreeSet::new(),
            versions: BTreeMap::new(),
            provides: BTreeMap::new(),
        }
    }

    /// Build a resolution from its resolved packages
    pub fn from_packages<I>(arch: Arch, packages: I) -> Self
    where
        I: IntoIterator<Item = ResolvedPackage>,
    {
        let mut resolution = Self::new(arch);
        for package in packages {
            resolution.insert(package);
        }
        resolution
    }

    /// Record a resolved package, replacing any earlier entry of that name
    pub fn insert(&mut self, package: ResolvedPackage) {
        let ResolvedPackage {
            name,
            version,
            provides,
        } = package;
        self.packages.insert(name.clone());
        self.versions.insert(name.clone(), version);
        if provides.is_empty() {
            self.provides.remove(&name);
        } else {
            self.provides.insert(name, provides);
        }
    }

    /// Builder-style [`ArchResolution::insert`]
    #[must_use]
    pub fn with(mut self, package: ResolvedPackage) -> Self {
        self.insert(package);
        self
    }

    #[must_use]
    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    #[must_use]
    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    #[must_use]
    pub fn versions(&self) -> &BTreeMap<String, String> {
        &self.versions
    }

    #[must_use]
    pub fn provides(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.provides
    }

    /// Exact version resolved for a package, if this architecture has it
    #[must_use]
    pub fn version(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    /// Every package rendered as an exact `name=version` pin, sorted by name
    #[must_use]
    pub fn pinned_packages(&self) -> Vec<String> {
        self.versions
            .iter()
            .map(|(name, version)| PackageSpec::pinned(name.as_str(), version).to_string())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
