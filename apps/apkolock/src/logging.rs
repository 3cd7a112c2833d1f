//! Structured logging integration for events
//!
//! Every event drained from the channel becomes one tracing record at the
//! level recorded in its metadata, carrying the event's own fields.

use apkolock_events::{AppEvent, EventMessage, GeneralEvent, LockEvent, PublishEvent, ResolverEvent};
use tracing::Level;

/// Emit a tracing record at a level chosen at runtime
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    };
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let level = meta.tracing_level();
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref();

    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                log_at!(level, source, event_id = %meta.event_id, correlation = ?correlation, context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                log_at!(level, source, event_id = %meta.event_id, correlation = ?correlation, details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                log_at!(level, source, event_id = %meta.event_id, correlation = ?correlation, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                log_at!(level, source, event_id = %meta.event_id, correlation = ?correlation, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                log_at!(level, source, event_id = %meta.event_id, correlation = ?correlation, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                log_at!(
                    level,
                    source,
                    event_id = %meta.event_id,
                    correlation = ?correlation,
                    operation = %operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            }
        },

        AppEvent::Resolver(event) => match event {
            ResolverEvent::FanOutStarted { archs, requested } => {
                log_at!(level, source, correlation = ?correlation, archs = ?archs, requested, "Resolving for every architecture");
            }
            ResolverEvent::ArchStarted { arch } => {
                log_at!(level, source, correlation = ?correlation, arch = %arch, "Resolving architecture");
            }
            ResolverEvent::ArchCompleted {
                arch,
                packages,
                duration_ms,
            } => {
                log_at!(level, source, correlation = ?correlation, arch = %arch, packages, duration_ms, "Architecture resolved");
            }
            ResolverEvent::ArchFailed { arch, failure } => {
                log_at!(
                    level,
                    source,
                    correlation = ?correlation,
                    arch = %arch,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    "Architecture failed to resolve"
                );
            }
            ResolverEvent::FanOutCompleted { archs, duration_ms } => {
                log_at!(level, source, correlation = ?correlation, archs, duration_ms, "Resolution finished");
            }
        },

        AppEvent::Lock(event) => match event {
            LockEvent::Started {
                config_id,
                archs,
                packages,
            } => {
                log_at!(level, source, correlation = ?correlation, config_id = %config_id, archs = ?archs, packages, "Locking configuration");
            }
            LockEvent::Unified { pinned, unpinned } => {
                log_at!(level, source, correlation = ?correlation, pinned, unpinned, "Package list unified");
            }
            LockEvent::Diagnostic {
                severity,
                summary,
                detail,
            } => {
                log_at!(level, source, correlation = ?correlation, severity = %severity, detail = %detail, "{summary}");
            }
            LockEvent::SnapshotWritten { path } => {
                log_at!(level, source, correlation = ?correlation, path = %path.display(), "Snapshot written");
            }
            LockEvent::Completed {
                config_id,
                errors,
                warnings,
            } => {
                log_at!(level, source, correlation = ?correlation, config_id = %config_id, errors, warnings, "Lock completed");
            }
            LockEvent::TagsComputed {
                package,
                version,
                tags,
            } => {
                log_at!(level, source, correlation = ?correlation, package = %package, version = %version, tags = ?tags, "Version tags computed");
            }
            LockEvent::StreamResolved {
                component,
                stream,
                tags,
            } => {
                log_at!(level, source, correlation = ?correlation, component = %component, stream = %stream, tags, "Component resolved to version stream");
            }
        },

        AppEvent::Publish(event) => match event {
            PublishEvent::BuildStarted { config_id, archs } => {
                log_at!(level, source, correlation = ?correlation, config_id = %config_id, archs, "Build started");
            }
            PublishEvent::BuildCompleted { digest, artifacts } => {
                log_at!(level, source, correlation = ?correlation, digest = %digest, artifacts, "Build completed");
            }
            PublishEvent::PushStarted { repository, arch } => {
                log_at!(level, source, correlation = ?correlation, repository = %repository, arch = ?arch, "Push started");
            }
            PublishEvent::PushRetrying {
                repository,
                attempt,
                delay_ms,
                error,
            } => {
                log_at!(level, source, correlation = ?correlation, repository = %repository, attempt, delay_ms, error = %error, "Push failed, retrying");
            }
            PublishEvent::PushCompleted { reference } => {
                log_at!(level, source, correlation = ?correlation, reference = %reference, "Push completed");
            }
            PublishEvent::Failed { failure } => {
                log_at!(
                    level,
                    source,
                    correlation = ?correlation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Publish failed"
                );
            }
        },
    }
}
