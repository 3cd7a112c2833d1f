#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for apkolock
//!
//! This crate sits between the CLI and the specialized crates: it merges
//! provider defaults into an image configuration, fans resolution out over
//! the architectures, unifies the results, derives version tags, maps
//! components onto version streams and drives image builds and pushes.

mod context;
mod lock;
mod publish;
pub mod retry;
mod streams;
mod tags;

pub use context::{OpsContextBuilder, OpsCtx};
pub use lock::{lock, snapshot_path, LockReport};
pub use publish::{build_image, BuiltImage, ImageBuilder, PublishReport, Publisher};
pub use streams::{
    resolve_streams, resolve_streams_from_source, stream_output_path, ResolvedComponent,
    StreamsReport, LATEST_TAG,
};
pub use tags::{get_pkg_version, stemmed_version_tags, version_tags, TagsReport};

use apkolock_errors::{Error, OpsError};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Lock report for one configuration
    LockReport(LockReport),
    /// Version tags for one package
    Tags(TagsReport),
    /// Components resolved against their version streams
    Streams(StreamsReport),
    /// Published image references
    Published(PublishReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns `OpsError::SerializationError` if the result cannot be
    /// serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Whether the operation succeeded without blocking diagnostics
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::LockReport(report) => !report.diagnostics.has_error(),
            OperationResult::Tags(_)
            | OperationResult::Streams(_)
            | OperationResult::Published(_)
            | OperationResult::Success(_) => true,
        }
    }
}
