//! Package resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("no resolution available for architecture {arch}")]
    ArchitectureUnavailable { arch: String },

    #[error("resolution failed for {arch}: {message}")]
    Failed { arch: String, message: String },

    #[error("invalid resolution data: {message}")]
    InvalidData { message: String },

    #[error("no architectures requested")]
    NoArchitectures,

    #[error("resolution task failed: {message}")]
    TaskFailed { message: String },
}

impl UserFacingError for ResolveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ArchitectureUnavailable { .. } => Some(
                "Record a resolution for every target architecture or narrow `archs` in the image config.",
            ),
            Self::InvalidData { .. } => {
                Some("Check that the resolutions file maps architectures to package lists.")
            }
            Self::NoArchitectures => Some("Declare at least one architecture."),
            Self::Failed { .. } | Self::TaskFailed { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::TaskFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ArchitectureUnavailable { .. } => "resolve.architecture_unavailable",
            Self::Failed { .. } => "resolve.failed",
            Self::InvalidData { .. } => "resolve.invalid_data",
            Self::NoArchitectures => "resolve.no_architectures",
            Self::TaskFailed { .. } => "resolve.task_failed",
        };
        Some(code)
    }
}
