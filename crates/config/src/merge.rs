//! Folding provider and request defaults into an image configuration

use crate::ProviderConfig;
use apkolock_errors::Error;
use apkolock_hash::Hash;
use apkolock_types::{Arch, ImageConfiguration, PackageSpec};
use std::collections::{BTreeMap, BTreeSet};

/// Per-request additions layered between the provider defaults and the image
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub extra_packages: Vec<String>,
    pub default_annotations: BTreeMap<String, String>,
}

/// An image configuration with every default applied, plus its content id
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub id: Hash,
    pub config: ImageConfiguration,
}

/// Apply provider and request defaults to a parsed image configuration
///
/// - repositories, build repositories and keyring become the sorted union of
///   the image's and the provider's lists
/// - extra packages are added unless a package of the same name is already
///   declared; the resulting list is sorted
/// - annotations: image over request over provider
/// - architectures default to the provider's, then to every known one, and
///   are deduplicated in canonical form
/// - layering defaults to the provider's and must validate
///
/// # Errors
///
/// Returns `ConfigError::InvalidLayering` for an unusable layering, or
/// `ConfigError::SerializeError` if the identifier cannot be computed.
pub fn merge_image_config(
    mut ic: ImageConfiguration,
    provider: &ProviderConfig,
    request: &ImageRequest,
) -> Result<MergedConfig, Error> {
    let contents = &mut ic.contents;
    contents.repositories = sorted_union(&contents.repositories, &provider.extra_repositories);
    contents.build_repositories =
        sorted_union(&contents.build_repositories, &provider.build_repositories);
    contents.keyring = sorted_union(&contents.keyring, &provider.extra_keyring);

    let mut declared: BTreeSet<String> = contents
        .packages
        .iter()
        .map(|p| PackageSpec::parse(p).name)
        .collect();
    let mut packages: BTreeSet<String> = contents.packages.drain(..).collect();
    for extra in provider.extra_packages.iter().chain(&request.extra_packages) {
        if declared.insert(PackageSpec::parse(extra).name) {
            packages.insert(extra.clone());
        } else {
            tracing::debug!(package = %extra, "extra package already declared");
        }
    }
    contents.packages = packages.into_iter().collect();

    let mut annotations = provider.default_annotations.clone();
    annotations.extend(request.default_annotations.clone());
    annotations.append(&mut ic.annotations);
    ic.annotations = annotations;

    let archs = match (ic.archs.is_empty(), provider.default_archs.is_empty()) {
        (false, _) => std::mem::take(&mut ic.archs),
        (true, false) => provider.default_archs.clone(),
        (true, true) => Arch::all(),
    };
    let mut seen = BTreeSet::new();
    ic.archs = archs
        .into_iter()
        .map(|arch| Arch::parse(arch.as_str()))
        .filter(|arch| seen.insert(arch.clone()))
        .collect();

    if ic.layering.is_none() {
        ic.layering.clone_from(&provider.default_layering);
    }
    if let Some(layering) = &ic.layering {
        layering.validate()?;
    }

    let id = Hash::from_json(&ic)?;
    Ok(MergedConfig { id, config: ic })
}

fn sorted_union(ours: &[String], theirs: &[String]) -> Vec<String> {
    ours.iter()
        .chain(theirs)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
