//! Mapping component configurations onto version streams

use crate::{version_tags, OpsCtx};
use apkolock_errors::{Error, OpsError};
use apkolock_events::{AppEvent, EventEmitter, LockEvent};
use apkolock_types::{ImageConfiguration, LockSource, StreamPlan, VersionStream, VersionStreams};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tag added to every component of the latest stream
pub const LATEST_TAG: &str = "latest";

/// One component resolved against its version stream
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedComponent {
    pub resolved: ImageConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<ImageConfiguration>,
    pub version_stream_name: String,
    pub component: String,
    pub tags: Vec<String>,
    /// Stream metadata, with `main` already overridden by the component
    #[serde(flatten)]
    pub stream: VersionStream,
}

/// Every resolved component, keyed by component name
#[derive(Clone, Debug, Default, Serialize)]
pub struct StreamsReport {
    pub resolved: BTreeMap<String, ResolvedComponent>,
    /// Components no stream matched
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

/// Output file for one component and stage (`resolved` or `locked`)
#[must_use]
pub fn stream_output_path(dir: &Path, stream: &str, component: &str, stage: &str) -> PathBuf {
    dir.join(format!("{stream}.{component}.{stage}.yaml"))
}

/// Resolve every component of `plan` against its version stream
///
/// Components with a locked configuration get tags derived from the pinned
/// version of their `main` package, plus `latest` for the latest stream.
/// When an output directory is configured, each component's configuration
/// and lock are written there as YAML.
///
/// # Errors
///
/// Returns an error if a locked configuration has no usable version for its
/// `main` package or an output file cannot be written.
pub async fn resolve_streams(ctx: &OpsCtx, plan: &StreamPlan) -> Result<StreamsReport, Error> {
    ctx.emit_operation_started("resolve streams");
    let result = resolve_streams_inner(ctx, plan).await;
    match &result {
        Ok(_) => ctx.emit_operation_completed("resolve streams", true),
        Err(e) => ctx.emit_operation_failed("resolve streams", e),
    }
    result
}

async fn resolve_streams_inner(ctx: &OpsCtx, plan: &StreamPlan) -> Result<StreamsReport, Error> {
    let mut report = StreamsReport::default();

    for (name, component) in &plan.configs {
        let Some((stream_name, stream)) = plan.versions.matching(name) else {
            ctx.emit_warning_with_context("No version stream matches component", name.clone());
            report.unmatched.push(name.clone());
            continue;
        };

        let mut stream = stream.clone();
        if let Some(main) = component.main.as_ref().filter(|main| !main.is_empty()) {
            stream.main.clone_from(main);
        }

        let mut tags = Vec::new();
        if let Some(locked) = &component.locked {
            tags = version_tags(ctx, locked, &stream.main)?.tags;
            if stream.is_latest {
                tags.push(LATEST_TAG.to_string());
            }
        } else {
            ctx.emit_debug(format!("{name} is not locked yet, no tags derived"));
        }

        if let Some(dir) = &ctx.config.general.out_dir {
            write_component(dir, stream_name, name, "resolved", &component.config).await?;
            if let Some(locked) = &component.locked {
                write_component(dir, stream_name, name, "locked", locked).await?;
            }
        }

        ctx.emit(AppEvent::Lock(LockEvent::StreamResolved {
            component: name.clone(),
            stream: stream_name.to_string(),
            tags: tags.len(),
        }));
        report.resolved.insert(
            name.clone(),
            ResolvedComponent {
                resolved: component.config.clone(),
                locked: component.locked.clone(),
                version_stream_name: stream_name.to_string(),
                component: component.component.clone(),
                tags,
                stream,
            },
        );
    }

    Ok(report)
}

/// Build the report from previously computed locks instead of a plan
///
/// Each lock is keyed by stream name; its `index` configuration becomes the
/// resolved configuration and its recorded tags are carried over.
///
/// # Errors
///
/// Returns `OpsError::StreamNotFound` for a lock without a stream, or a
/// parse error for a malformed `index` entry.
pub fn resolve_streams_from_source(
    ctx: &OpsCtx,
    versions: &VersionStreams,
    source: &LockSource,
) -> Result<StreamsReport, Error> {
    let mut report = StreamsReport::default();

    for (name, lock) in &source.image_locks {
        let stream = versions
            .versions
            .get(name)
            .ok_or_else(|| OpsError::StreamNotFound {
                component: name.clone(),
            })?;
        let resolved = lock.index_config()?;

        let mut stream = stream.clone();
        stream.main.clone_from(&lock.main);

        ctx.emit(AppEvent::Lock(LockEvent::StreamResolved {
            component: name.clone(),
            stream: name.clone(),
            tags: lock.tags.len(),
        }));
        report.resolved.insert(
            name.clone(),
            ResolvedComponent {
                resolved,
                locked: None,
                version_stream_name: name.clone(),
                component: String::new(),
                tags: lock.tags.clone(),
                stream,
            },
        );
    }

    Ok(report)
}

async fn write_component(
    dir: &Path,
    stream: &str,
    component: &str,
    stage: &str,
    config: &ImageConfiguration,
) -> Result<(), Error> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;
    let path = stream_output_path(dir, stream, component, stage);
    tokio::fs::write(&path, config.to_yaml()?)
        .await
        .map_err(|e| Error::io_with_path(&e, &path))?;
    tracing::debug!(path = %path.display(), "wrote component configuration");
    Ok(())
}
