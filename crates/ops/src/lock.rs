//! Locking an image configuration across its architectures

use crate::OpsCtx;
use apkolock_config::{merge_image_config, ImageRequest};
use apkolock_errors::{Error, OpsError};
use apkolock_events::{AppEvent, EventEmitter, LockEvent};
use apkolock_hash::Hash;
use apkolock_resolver::{resolve_all, unify, ResolveRequest};
use apkolock_types::{Arch, Diagnostics, ImageConfiguration};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of locking one image configuration
#[derive(Clone, Debug, Serialize)]
pub struct LockReport {
    /// Content hash of the merged configuration before resolution
    pub id: Hash,
    /// Multi-architecture configuration with the unified package list
    pub index: ImageConfiguration,
    /// Single-architecture configurations pinned to each architecture's own
    /// resolution
    pub archs: BTreeMap<Arch, ImageConfiguration>,
    pub diagnostics: Diagnostics,
}

impl LockReport {
    /// Fail if unification produced any error diagnostic
    ///
    /// # Errors
    ///
    /// Returns `OpsError::LockFailed` with the number of error diagnostics.
    pub fn ensure_locked(&self) -> Result<(), Error> {
        let count = self.diagnostics.error_count();
        if count > 0 {
            return Err(OpsError::LockFailed { count }.into());
        }
        Ok(())
    }
}

/// Merge defaults into `ic`, resolve it for every architecture and unify
///
/// Error diagnostics do not fail the operation; see
/// [`LockReport::ensure_locked`].
///
/// # Errors
///
/// Returns an error if merging the configuration fails, any architecture
/// fails to resolve, or a snapshot cannot be written.
pub async fn lock(
    ctx: &OpsCtx,
    ic: ImageConfiguration,
    request: &ImageRequest,
) -> Result<LockReport, Error> {
    ctx.emit_operation_started("lock");
    let result = lock_inner(ctx, ic, request).await;
    match &result {
        Ok(_) => ctx.emit_operation_completed("lock", true),
        Err(e) => ctx.emit_operation_failed("lock", e),
    }
    result
}

async fn lock_inner(
    ctx: &OpsCtx,
    ic: ImageConfiguration,
    request: &ImageRequest,
) -> Result<LockReport, Error> {
    let merged = merge_image_config(ic, &ctx.config.provider, request)?;
    let config = merged.config;
    let id = merged.id;

    ctx.emit(AppEvent::Lock(LockEvent::Started {
        config_id: id.to_hex(),
        archs: config.archs.iter().map(ToString::to_string).collect(),
        packages: config.contents.packages.len(),
    }));
    write_snapshot(ctx, &id, "pre", &config).await?;

    let resolve_request = ResolveRequest::from_config(&config);
    let resolutions = resolve_all(
        Arc::clone(&ctx.resolver),
        &resolve_request,
        &config.archs,
        &ctx.tx,
    )
    .await?;

    let unified = unify(&config.contents.packages, &resolutions);
    let pinned = unified.pinned_count();
    ctx.emit(AppEvent::Lock(LockEvent::Unified {
        pinned,
        unpinned: unified.packages.len() - pinned,
    }));
    for diagnostic in &unified.diagnostics {
        ctx.emit(AppEvent::Lock(LockEvent::Diagnostic {
            severity: diagnostic.severity,
            summary: diagnostic.summary.clone(),
            detail: diagnostic.detail.clone(),
        }));
    }

    let archs = resolutions
        .iter()
        .map(|resolution| {
            let mut arch_config = config.with_packages(resolution.pinned_packages());
            arch_config.archs = vec![resolution.arch().clone()];
            (resolution.arch().clone(), arch_config)
        })
        .collect();
    let index = config.with_packages(unified.packages);
    write_snapshot(ctx, &id, "post", &index).await?;

    let diagnostics = unified.diagnostics;
    ctx.emit(AppEvent::Lock(LockEvent::Completed {
        config_id: id.to_hex(),
        errors: diagnostics.error_count(),
        warnings: diagnostics.len() - diagnostics.error_count(),
    }));

    Ok(LockReport {
        id,
        index,
        archs,
        diagnostics,
    })
}

/// Path of a snapshot file: `<dir>/<short id>.<stage>.apko.json`
#[must_use]
pub fn snapshot_path(dir: &Path, id: &Hash, stage: &str) -> PathBuf {
    dir.join(format!("{}.{stage}.apko.json", id.short()))
}

async fn write_snapshot(
    ctx: &OpsCtx,
    id: &Hash,
    stage: &str,
    config: &ImageConfiguration,
) -> Result<(), Error> {
    let Some(dir) = &ctx.config.general.out_dir else {
        return Ok(());
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;
    let path = snapshot_path(dir, id, stage);
    tokio::fs::write(&path, config.to_json()?)
        .await
        .map_err(|e| Error::io_with_path(&e, &path))?;

    tracing::debug!(path = %path.display(), "wrote configuration snapshot");
    ctx.emit(AppEvent::Lock(LockEvent::SnapshotWritten { path }));
    Ok(())
}
