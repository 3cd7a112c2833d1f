use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Build and publish domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PublishEvent {
    /// Image build started for a locked configuration
    BuildStarted { config_id: String, archs: usize },

    /// Image build produced an index digest and per-architecture artifacts
    BuildCompleted { digest: String, artifacts: usize },

    /// Push of one artifact started; `arch` is `None` for the index
    PushStarted {
        repository: String,
        arch: Option<String>,
    },

    /// A push attempt failed and will be retried after `delay_ms`
    PushRetrying {
        repository: String,
        attempt: u32,
        delay_ms: u64,
        error: String,
    },

    /// Push finished with the published reference
    PushCompleted { reference: String },

    /// Build or publish failed
    Failed { failure: FailureContext },
}
