//! Version tags derived from a locked package

use crate::OpsCtx;
use apkolock_errors::{Error, OpsError};
use apkolock_events::{AppEvent, EventEmitter, LockEvent};
use apkolock_types::ImageConfiguration;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tags computed for one package of a locked configuration
#[derive(Clone, Debug, Default, Serialize)]
pub struct TagsReport {
    pub package: String,
    /// Pinned version the tags were derived from; `None` when tags are disabled
    pub version: Option<String>,
    pub tags: Vec<String>,
}

/// Compute the version tags for `target` in a locked configuration
///
/// When version tags are disabled by configuration the report carries no
/// tags and a warning is emitted.
///
/// # Errors
///
/// Returns an error if the package list is not fully pinned or `target`
/// cannot be matched to exactly one version.
pub fn version_tags(
    ctx: &OpsCtx,
    locked: &ImageConfiguration,
    target: &str,
) -> Result<TagsReport, Error> {
    if ctx.config.general.disable_version_tags {
        ctx.emit_warning_with_context(
            "Version tags disabled",
            "version tags are disabled by the disable_version_tags setting",
        );
        return Ok(TagsReport {
            package: target.to_string(),
            ..TagsReport::default()
        });
    }

    let version = get_pkg_version(&locked.contents.packages, target)?;
    let tags = stemmed_version_tags(&version);
    ctx.emit(AppEvent::Lock(LockEvent::TagsComputed {
        package: target.to_string(),
        version: version.clone(),
        tags: tags.clone(),
    }));

    Ok(TagsReport {
        package: target.to_string(),
        version: Some(version),
        tags,
    })
}

/// Find the pinned version of `target` in a list of `name=version` entries
///
/// An exact name match wins. Otherwise every package named `<target>-*` is
/// considered, and they must all agree on one version.
///
/// # Errors
///
/// Returns `OpsError::InvalidPackage` for an entry without `=`,
/// `OpsError::AmbiguousPackage` when prefix matches disagree and
/// `OpsError::PackageNotFound` when nothing matches.
pub fn get_pkg_version(packages: &[String], target: &str) -> Result<String, Error> {
    let mut pinned = BTreeMap::new();
    for entry in packages {
        let (name, version) = entry
            .split_once('=')
            .ok_or_else(|| OpsError::InvalidPackage {
                entry: entry.clone(),
            })?;
        pinned.insert(name, version);
    }

    if let Some(version) = pinned.get(target) {
        return Ok((*version).to_string());
    }

    let prefix = format!("{target}-");
    let mut found: Option<(&str, &str)> = None;
    for (name, version) in pinned.iter().filter(|(name, _)| name.starts_with(&prefix)) {
        match found {
            Some((first, first_version)) if first_version != *version => {
                return Err(OpsError::AmbiguousPackage {
                    first: first.to_string(),
                    first_version: first_version.to_string(),
                    second: (*name).to_string(),
                    second_version: (*version).to_string(),
                }
                .into());
            }
            Some(_) => {}
            None => found = Some((*name, *version)),
        }
    }

    found
        .map(|(_, version)| version.to_string())
        .ok_or_else(|| {
            OpsError::PackageNotFound {
                package: target.to_string(),
            }
            .into()
        })
}

/// Every `.`-boundary prefix of `version` plus the version itself, sorted
///
/// The last component keeps its text up to the final `-`, so `1.2.3-r4`
/// yields `1`, `1.2`, `1.2.3` and `1.2.3-r4`.
#[must_use]
pub fn stemmed_version_tags(version: &str) -> Vec<String> {
    let parts: Vec<&str> = version.split('.').filter(|p| !p.is_empty()).collect();
    let mut tags = Vec::with_capacity(parts.len() + 1);
    for end in 1..=parts.len() {
        let stem = parts[..end].join(".");
        if stem == version {
            if let Some((release, _)) = version.rsplit_once('-') {
                tags.push(release.to_string());
            }
        } else {
            tags.push(stem);
        }
    }
    tags.push(version.to_string());
    tags.sort();
    tags.dedup();
    tags
}
