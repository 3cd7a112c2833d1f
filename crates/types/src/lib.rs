#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for apkolock
//!
//! This crate provides the fundamental types shared by the lock engine and
//! its collaborators: architectures, package specifiers, per-architecture
//! resolutions, the image configuration model, version streams and
//! diagnostics.

pub mod diagnostics;
pub mod image;
pub mod package;
pub mod resolution;
pub mod stream;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use image::{
    ImageAccounts, ImageConfiguration, ImageContents, ImageEntrypoint, ImageGroup, ImageUser,
    Layering, LAYERING_STRATEGY_ORIGIN,
};
pub use package::PackageSpec;
pub use resolution::{ArchResolution, ResolvedPackage};
pub use stream::{ComponentConfig, LockSource, SourceLock, StreamPlan, VersionStream, VersionStreams};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target architecture, always held in its canonical (OCI platform) form
///
/// Construction goes through [`Arch::parse`], which folds the APK spellings
/// (`x86_64`, `aarch64`, `armv7`, ...) onto the canonical names so two
/// spellings of one architecture compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Arch(String);

/// Canonical names of every architecture apko knows how to build
const KNOWN_ARCHS: [&str; 8] = [
    "386", "amd64", "arm/v6", "arm/v7", "arm64", "ppc64le", "riscv64", "s390x",
];

impl Arch {
    /// Parse an architecture from either its canonical or its APK spelling
    ///
    /// Unknown names are kept verbatim.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let canonical = match s.trim() {
            "x86_64" | "amd64" => "amd64",
            "x86" | "386" => "386",
            "aarch64" | "arm64" => "arm64",
            "armhf" | "arm/v6" => "arm/v6",
            "armv7" | "arm/v7" => "arm/v7",
            other => other,
        };
        Self(canonical.to_string())
    }

    /// Parse a list of architecture names
    #[must_use]
    pub fn parse_all<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(|n| Self::parse(n.as_ref())).collect()
    }

    /// Every architecture apko can target, in canonical order
    #[must_use]
    pub fn all() -> Vec<Self> {
        KNOWN_ARCHS.iter().map(|a| Self((*a).to_string())).collect()
    }

    /// Canonical name (`amd64`, `arm64`, `arm/v7`, ...)
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name used by APK repositories (`x86_64`, `aarch64`, `armv7`, ...)
    #[must_use]
    pub fn to_apk(&self) -> &str {
        match self.0.as_str() {
            "amd64" => "x86_64",
            "386" => "x86",
            "arm64" => "aarch64",
            "arm/v6" => "armhf",
            "arm/v7" => "armv7",
            other => other,
        }
    }
}

impl From<String> for Arch {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.0
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
