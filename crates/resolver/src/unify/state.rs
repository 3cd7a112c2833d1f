//! The intersection accumulator

use apkolock_types::{ArchResolution, PackageSpec};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Packages that resolved to the same version on every architecture folded so far
///
/// Seeded from one architecture and only ever narrowed by [`UnifiedState::fold`],
/// so the final state does not depend on the order architectures are folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedState {
    packages: BTreeSet<String>,
    versions: BTreeMap<String, String>,
    provides: BTreeMap<String, BTreeSet<String>>,
}

impl UnifiedState {
    /// Start from a full copy of one architecture's resolution
    #[must_use]
    pub fn seed(first: &ArchResolution) -> Self {
        Self {
            packages: first.packages().clone(),
            versions: first.versions().clone(),
            provides: first.provides().clone(),
        }
    }

    /// Narrow the state to what `next` agrees with
    ///
    /// A package survives when `next` resolved it to the same version. Its
    /// provided capabilities shrink to those `next` also reports.
    #[must_use]
    pub fn fold(self, next: &ArchResolution) -> Self {
        if next.versions() == &self.versions && next.provides() == &self.provides {
            return self;
        }

        let Self {
            packages,
            mut versions,
            mut provides,
        } = self;

        let mut kept = Self {
            packages: BTreeSet::new(),
            versions: BTreeMap::new(),
            provides: BTreeMap::new(),
        };
        for name in packages {
            let Some(version) = versions.remove(&name) else {
                continue;
            };
            if next.version(&name) != Some(version.as_str()) {
                continue;
            }

            if let (Some(ours), Some(theirs)) = (provides.remove(&name), next.provides().get(&name))
            {
                let shared: BTreeSet<String> = ours.intersection(theirs).cloned().collect();
                if !shared.is_empty() {
                    kept.provides.insert(name.clone(), shared);
                }
            }
            kept.versions.insert(name.clone(), version);
            kept.packages.insert(name);
        }
        kept
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

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    /// Whether some pinned package provides `capability`
    #[must_use]
    pub fn is_provided(&self, capability: &str) -> bool {
        self.provides
            .values()
            .any(|provided| provided.contains(capability))
    }

    /// Every surviving package as a `name=version` pin
    pub fn pins(&self) -> impl Iterator<Item = String> + '_ {
        self.versions
            .iter()
            .map(|(name, version)| PackageSpec::pinned(name.as_str(), version).to_string())
    }
}
