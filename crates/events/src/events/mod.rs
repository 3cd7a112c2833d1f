use serde::{Deserialize, Serialize};

use crate::EventSource;
use apkolock_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod lock;
pub mod publish;
pub mod resolver;

pub use general::*;
pub use lock::*;
pub use publish::*;
pub use resolver::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Per-architecture resolution fan-out
    Resolver(ResolverEvent),

    /// Unification, diagnostics, snapshots and tags
    Lock(LockEvent),

    /// Image build and registry pushes
    Publish(PublishEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Resolver(_) => EventSource::RESOLVER,
            Self::Lock(_) => EventSource::LOCK,
            Self::Publish(_) => EventSource::PUBLISH,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use apkolock_types::Severity;
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Resolver(ResolverEvent::ArchFailed { .. })
            | Self::Lock(LockEvent::Diagnostic {
                severity: Severity::Error,
                ..
            })
            | Self::Publish(PublishEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Lock(LockEvent::Diagnostic {
                severity: Severity::Warning,
                ..
            })
            | Self::Publish(PublishEvent::PushRetrying { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Resolver(ResolverEvent::ArchStarted { .. } | ResolverEvent::ArchCompleted { .. })
            | Self::Lock(LockEvent::SnapshotWritten { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }
}
