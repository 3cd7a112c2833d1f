//! Operations context for dependency injection

use crate::{ImageBuilder, Publisher};
use apkolock_config::Config;
use apkolock_errors::{Error, OpsError};
use apkolock_events::{EventEmitter, EventSender};
use apkolock_resolver::PackageResolver;
use std::sync::Arc;

/// Operations context providing access to the lock collaborators
pub struct OpsCtx {
    /// Per-architecture package resolver
    pub resolver: Arc<dyn PackageResolver>,
    /// Image builder, only needed for publishing
    pub builder: Option<Arc<dyn ImageBuilder>>,
    /// Registry client, only needed for publishing
    pub publisher: Option<Arc<dyn Publisher>>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Provider configuration
    pub config: Config,
    correlation_id: String,
}

impl OpsCtx {
    /// Identifier stamped onto every event emitted through this context
    #[must_use]
    pub fn correlation(&self) -> &str {
        &self.correlation_id
    }

    pub(crate) fn builder(&self) -> Result<&Arc<dyn ImageBuilder>, Error> {
        self.builder.as_ref().ok_or_else(|| missing("builder"))
    }

    pub(crate) fn publisher(&self) -> Result<&Arc<dyn Publisher>, Error> {
        self.publisher.as_ref().ok_or_else(|| missing("publisher"))
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }

    fn correlation_id(&self) -> Option<&str> {
        Some(&self.correlation_id)
    }
}

/// Builder for operations context
pub struct OpsContextBuilder {
    resolver: Option<Arc<dyn PackageResolver>>,
    builder: Option<Arc<dyn ImageBuilder>>,
    publisher: Option<Arc<dyn Publisher>>,
    tx: Option<EventSender>,
    config: Option<Config>,
    correlation_id: Option<String>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: None,
            builder: None,
            publisher: None,
            tx: None,
            config: None,
            correlation_id: None,
        }
    }

    /// Set resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn PackageResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set image builder
    #[must_use]
    pub fn with_builder(mut self, builder: Arc<dyn ImageBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Set registry publisher
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a fixed correlation id instead of a generated one
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Build the context
    ///
    /// The configuration falls back to defaults. Builder and publisher stay
    /// optional until an operation needs them.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::MissingComponent` if the resolver or the event
    /// sender was not provided.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let resolver = self.resolver.ok_or_else(|| missing("resolver"))?;
        let tx = self.tx.ok_or_else(|| missing("event sender"))?;

        Ok(OpsCtx {
            resolver,
            builder: self.builder,
            publisher: self.publisher,
            tx,
            config: self.config.unwrap_or_default(),
            correlation_id: self
                .correlation_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        })
    }
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(component: &str) -> Error {
    OpsError::MissingComponent {
        component: component.to_string(),
    }
    .into()
}
