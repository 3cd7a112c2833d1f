#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in apkolock
//!
//! Library crates never print. Everything a user might want to see goes
//! through this channel and the CLI decides how to render or log it.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by functional area (`Resolver`, `Lock`, `Publish`)
//! - **`EventEmitter` trait**: one emission API whether you hold a raw
//!   `EventSender` or a context struct that contains one
//! - **Metadata envelope**: every event travels with an [`EventMeta`] carrying
//!   its id, timestamp, level and optional correlation id

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, FailureContext, GeneralEvent, LockEvent, PublishEvent, ResolverEvent,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event paired with its metadata envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout apkolock
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Correlation id stamped onto every event this emitter sends
    fn correlation_id(&self) -> Option<&str> {
        None
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        if let Some(id) = self.correlation_id() {
            meta = meta.with_correlation_id(id);
        }
        self.emit_with_meta(meta, event);
    }

    /// Emit an event with caller-supplied metadata
    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed<E>(&self, operation: impl Into<String>, error: &E)
    where
        E: apkolock_errors::UserFacingError + ?Sized,
    {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure: FailureContext::from_error(error),
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
