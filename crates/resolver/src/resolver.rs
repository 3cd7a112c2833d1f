//! Resolver seam

use apkolock_errors::Error;
use apkolock_types::{Arch, ArchResolution, ImageConfiguration, PackageSpec};
use async_trait::async_trait;

/// Package list and sources handed to a resolver for one architecture
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Declared specifiers, constraints intact
    pub packages: Vec<PackageSpec>,
    /// Repositories to resolve against, build-only repositories included
    pub repositories: Vec<String>,
    pub keyring: Vec<String>,
}

impl ResolveRequest {
    /// Request for a bare package list with no sources
    #[must_use]
    pub fn new(packages: &[String]) -> Self {
        Self {
            packages: packages.iter().map(|p| PackageSpec::parse(p)).collect(),
            ..Self::default()
        }
    }

    /// Request covering everything a merged image configuration declares
    #[must_use]
    pub fn from_config(config: &ImageConfiguration) -> Self {
        let contents = &config.contents;
        let mut repositories = contents.build_repositories.clone();
        repositories.extend(contents.repositories.iter().cloned());
        Self {
            packages: contents
                .packages
                .iter()
                .map(|p| PackageSpec::parse(p))
                .collect(),
            repositories,
            keyring: contents.keyring.clone(),
        }
    }

    /// Bare names of the declared packages
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|spec| spec.name.as_str())
    }
}

/// Resolves a package list to its transitive closure for one architecture
///
/// Implementations return every package in the closure with its exact
/// version and the bare capability names it provides. Raw provides entries
/// must be cleaned with [`crate::capability_name`] before they are returned.
#[async_trait]
pub trait PackageResolver: Send + Sync {
    /// Resolve `request` for `arch`
    ///
    /// # Errors
    ///
    /// Returns an error if the package list cannot be resolved for `arch`.
    async fn resolve(&self, arch: &Arch, request: &ResolveRequest)
        -> Result<ArchResolution, Error>;
}
