//! Resolver backed by previously recorded resolutions
//!
//! The document maps each architecture to the packages it resolved:
//!
//! ```json
//! { "x86_64": { "packages": [ { "name": "foo", "version": "1.2.3-r0", "provides": ["cmd:foo=1.2.3"] } ] } }
//! ```
//!
//! Architecture keys are normalized and provides entries are cleaned on load.

use crate::provides::clean_provides;
use crate::{PackageResolver, ResolveRequest};
use apkolock_errors::{Error, ResolveError};
use apkolock_types::{Arch, ArchResolution, ResolvedPackage};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordedArch {
    #[serde(default)]
    packages: Vec<RecordedPackage>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordedPackage {
    name: String,
    version: String,
    #[serde(default)]
    provides: Vec<String>,
}

/// Serves per-architecture resolutions from memory
#[derive(Clone, Debug, Default)]
pub struct RecordedResolver {
    resolutions: BTreeMap<Arch, ArchResolution>,
}

impl RecordedResolver {
    /// Build from already-constructed resolutions
    pub fn from_resolutions<I>(resolutions: I) -> Self
    where
        I: IntoIterator<Item = ArchResolution>,
    {
        Self {
            resolutions: resolutions
                .into_iter()
                .map(|resolution| (resolution.arch().clone(), resolution))
                .collect(),
        }
    }

    /// Parse a recorded resolutions document
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidData` if the document is malformed or
    /// records the same package twice for one architecture.
    pub fn from_json(contents: &str) -> Result<Self, Error> {
        let document: BTreeMap<String, RecordedArch> =
            serde_json::from_str(contents).map_err(|e| ResolveError::InvalidData {
                message: e.to_string(),
            })?;

        let mut resolutions = Vec::with_capacity(document.len());
        for (key, recorded) in document {
            let arch = Arch::parse(&key);
            let mut resolution = ArchResolution::new(arch.clone());
            for package in recorded.packages {
                if resolution.version(&package.name).is_some() {
                    return Err(ResolveError::InvalidData {
                        message: format!("package {} recorded twice for {arch}", package.name),
                    }
                    .into());
                }
                resolution.insert(
                    ResolvedPackage::new(package.name, package.version)
                        .with_provides(clean_provides(&package.provides)),
                );
            }
            resolutions.push(resolution);
        }

        Ok(Self::from_resolutions(resolutions))
    }

    /// Load a recorded resolutions document from disk
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// `ResolveError::InvalidData` if it cannot be parsed.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        Self::from_json(&contents)
    }

    /// Architectures with a recorded resolution
    pub fn archs(&self) -> impl Iterator<Item = &Arch> {
        self.resolutions.keys()
    }
}

#[async_trait]
impl PackageResolver for RecordedResolver {
    async fn resolve(
        &self,
        arch: &Arch,
        request: &ResolveRequest,
    ) -> Result<ArchResolution, Error> {
        let resolution =
            self.resolutions
                .get(arch)
                .ok_or_else(|| ResolveError::ArchitectureUnavailable {
                    arch: arch.to_string(),
                })?;

        // A declared name must be resolved directly or satisfied by a provider.
        for name in request.package_names() {
            let satisfied = resolution.packages().contains(name)
                || resolution
                    .provides()
                    .values()
                    .any(|provided| provided.contains(name));
            if !satisfied {
                return Err(ResolveError::Failed {
                    arch: arch.to_string(),
                    message: format!("package {name:?} not found in recorded resolution"),
                }
                .into());
            }
        }

        tracing::debug!(%arch, packages = resolution.len(), "serving recorded resolution");
        Ok(resolution.clone())
    }
}
