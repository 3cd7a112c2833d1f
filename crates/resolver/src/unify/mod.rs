//! Multi-architecture lock unification
//!
//! Every architecture resolves the declared package list independently and
//! may land on different versions. Unification keeps the packages all of
//! them agree on, pins those, and leaves declared packages that disagree
//! unpinned with their original constraint:
//!
//! 1. fold the per-architecture results into a [`UnifiedState`]
//! 2. declared names that did not survive are missing, unless a surviving
//!    package provides them
//! 3. each missing name becomes an error diagnostic, each architecture with
//!    dropped transitive packages gets one warning
//!
//! Unification never fails. Conflicts are reported, not raised.

mod report;
mod state;

pub use state::UnifiedState;

use apkolock_types::{ArchResolution, Diagnostics, PackageSpec};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Result of unifying a package list across architectures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Unified {
    /// Unpinned declared packages first, then `name=version` pins; each group sorted
    pub packages: Vec<String>,
    /// Errors first, then one warning per architecture in input order
    pub diagnostics: Diagnostics,
}

impl Unified {
    /// Number of entries pinned to an exact version by unification
    #[must_use]
    pub fn pinned_count(&self) -> usize {
        self.packages.len() - self.diagnostics.error_count()
    }
}

/// Unify `originals` against one resolution per architecture
///
/// An empty package list or an empty set of resolutions yields an empty
/// result with no diagnostics.
#[must_use]
pub fn unify(originals: &[String], inputs: &[ArchResolution]) -> Unified {
    let Some((first, rest)) = inputs.split_first() else {
        return Unified::default();
    };
    if originals.is_empty() {
        return Unified::default();
    }

    let declared: BTreeMap<String, PackageSpec> = originals
        .iter()
        .map(|original| {
            let spec = PackageSpec::parse(original);
            (spec.name.clone(), spec)
        })
        .collect();

    let state = rest
        .iter()
        .fold(UnifiedState::seed(first), UnifiedState::fold);

    let missing: BTreeSet<&str> = declared
        .keys()
        .map(String::as_str)
        .filter(|name| !state.contains(name) && !state.is_provided(name))
        .collect();

    let mut diagnostics: Diagnostics = missing
        .iter()
        .map(|name| report::inconsistent_version(name, inputs))
        .collect();
    for input in inputs {
        if let Some(warning) = report::arch_only(input, &state, &missing) {
            diagnostics.push(warning);
        }
    }

    let mut unpinned: Vec<String> = missing
        .iter()
        .filter_map(|name| declared.get(*name))
        .map(ToString::to_string)
        .collect();
    unpinned.sort();

    let mut pinned: Vec<String> = state.pins().collect();
    pinned.sort();

    let mut packages = unpinned;
    packages.extend(pinned);

    Unified {
        packages,
        diagnostics,
    }
}
