//! Image build and publish error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("no artifact built for architecture {arch}")]
    MissingArtifact { arch: String },

    #[error("push to {repository} failed: {message}")]
    PushFailed { repository: String, message: String },

    #[error("invalid repository reference: {repository}")]
    InvalidRepository { repository: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PushFailed { .. } => Some("Check registry credentials and connectivity."),
            Self::InvalidRepository { .. } => {
                Some("Use a repository reference such as registry.example.com/team/image.")
            }
            Self::MissingArtifact { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::PushFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingArtifact { .. } => "build.missing_artifact",
            Self::PushFailed { .. } => "build.push_failed",
            Self::InvalidRepository { .. } => "build.invalid_repository",
        };
        Some(code)
    }
}
