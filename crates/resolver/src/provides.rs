//! Cleaning of raw provides entries
//!
//! Package indexes record provided capabilities with an optional version,
//! e.g. `cmd:foo=1.0` or `so:libc.so.6=6`. Unification compares bare
//! capability names only.

use apkolock_types::PackageSpec;
use std::collections::BTreeSet;

/// Bare capability name of a raw provides entry
#[must_use]
pub fn capability_name(raw: &str) -> String {
    PackageSpec::parse(raw.trim()).name
}

/// Clean a list of raw provides entries into a set of capability names
pub fn clean_provides<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|entry| capability_name(entry.as_ref()))
        .filter(|name| !name.is_empty())
        .collect()
}
