use apkolock_types::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lock domain events: unification, diagnostics and derived outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LockEvent {
    /// Locking a merged configuration started
    Started {
        config_id: String,
        archs: Vec<String>,
        packages: usize,
    },

    /// Unification finished
    Unified { pinned: usize, unpinned: usize },

    /// A diagnostic produced while unifying
    Diagnostic {
        severity: Severity,
        summary: String,
        detail: String,
    },

    /// A configuration snapshot was written to the output directory
    SnapshotWritten { path: PathBuf },

    /// Locking finished
    Completed {
        config_id: String,
        errors: usize,
        warnings: usize,
    },

    /// Version tags computed for a locked package
    TagsComputed {
        package: String,
        version: String,
        tags: Vec<String>,
    },

    /// A component was matched to its version stream
    StreamResolved {
        component: String,
        stream: String,
        tags: usize,
    },
}
