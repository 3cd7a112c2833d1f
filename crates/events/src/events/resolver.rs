use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Resolver domain events for the per-architecture fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Fan-out across all target architectures started
    FanOutStarted { archs: Vec<String>, requested: usize },

    /// Resolution for one architecture started
    ArchStarted { arch: String },

    /// Resolution for one architecture finished
    ArchCompleted {
        arch: String,
        packages: usize,
        duration_ms: u64,
    },

    /// Resolution for one architecture failed; the fan-out is abandoned
    ArchFailed {
        arch: String,
        failure: FailureContext,
    },

    /// Every architecture resolved
    FanOutCompleted { archs: usize, duration_ms: u64 },
}
