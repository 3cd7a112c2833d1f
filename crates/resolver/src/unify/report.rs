//! Diagnostic synthesis

use super::UnifiedState;
use apkolock_types::{ArchResolution, Diagnostic};
use std::collections::{BTreeMap, BTreeSet};

/// Error for a declared package that no single version satisfies everywhere
///
/// The detail groups architectures by the version they resolved, e.g.
/// `2.4.6-r0 (amd64), 2.4.6-r1 (arm64)`. Architectures that never resolved
/// the package contribute nothing.
pub(crate) fn inconsistent_version(name: &str, inputs: &[ArchResolution]) -> Diagnostic {
    let mut by_version: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for input in inputs {
        if let Some(version) = input.version(name) {
            by_version
                .entry(version)
                .or_default()
                .insert(input.arch().as_str());
        }
    }

    let mut clusters: Vec<String> = by_version
        .into_iter()
        .map(|(version, archs)| {
            format!(
                "{version} ({})",
                archs.into_iter().collect::<Vec<_>>().join(", ")
            )
        })
        .collect();
    clusters.sort();

    Diagnostic::error(
        format!("Unable to lock package \"{name}\" to a consistent version"),
        clusters.join(", "),
    )
}

/// Warning for transitive packages only some architectures pulled in
///
/// The detail is the sorted name list in brackets, e.g. `[bonus x]`.
pub(crate) fn arch_only(
    input: &ArchResolution,
    state: &UnifiedState,
    missing: &BTreeSet<&str>,
) -> Option<Diagnostic> {
    let dropped: Vec<&str> = input
        .packages()
        .iter()
        .map(String::as_str)
        .filter(|name| !state.contains(name) && !missing.contains(name))
        .collect();

    if dropped.is_empty() {
        return None;
    }
    Some(Diagnostic::warning(
        format!("unable to lock certain packages for {}", input.arch()),
        format!("[{}]", dropped.join(" ")),
    ))
}
