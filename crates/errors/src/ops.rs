//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum OpsError {
    #[error("invalid package entry: {entry}")]
    InvalidPackage { entry: String },

    #[error("unable to find package {package} in package list")]
    PackageNotFound { package: String },

    #[error("multiple packages match with different versions: {first} ({first_version}) and {second} ({second_version})")]
    AmbiguousPackage {
        first: String,
        first_version: String,
        second: String,
        second_version: String,
    },

    #[error("package locks contain {count} error(s)")]
    LockFailed { count: usize },

    #[error("gave up after {attempts} attempts: {errors}")]
    RetriesExhausted { attempts: usize, errors: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("no version stream for {component}")]
    StreamNotFound { component: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPackage { .. } => {
                Some("Version tags need a locked configuration where every package is name=version.")
            }
            Self::PackageNotFound { .. } | Self::AmbiguousPackage { .. } => {
                Some("Name the exact package whose version should drive the tags.")
            }
            Self::StreamNotFound { .. } => {
                Some("Add a version stream with the same name as the locked component.")
            }
            Self::LockFailed { .. } => {
                Some("Align the package versions across architectures or relax the declared constraints.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidPackage { .. } => "ops.invalid_package",
            Self::PackageNotFound { .. } => "ops.package_not_found",
            Self::AmbiguousPackage { .. } => "ops.ambiguous_package",
            Self::LockFailed { .. } => "ops.lock_failed",
            Self::RetriesExhausted { .. } => "ops.retries_exhausted",
            Self::SerializationError { .. } => "ops.serialization_error",
            Self::StreamNotFound { .. } => "ops.stream_not_found",
            Self::MissingComponent { .. } => "ops.missing_component",
        };
        Some(code)
    }
}
