//! Image build and registry publication

use crate::retry::{retry, Backoff};
use crate::{LockReport, OpsCtx};
use apkolock_errors::{BuildError, Error};
use apkolock_events::{AppEvent, EventEmitter, FailureContext, PublishEvent};
use apkolock_types::{Arch, ImageConfiguration};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Digests produced by building a locked index configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuiltImage {
    /// Digest of the multi-architecture index
    pub digest: String,
    /// Digest of each per-architecture image
    pub archs: BTreeMap<Arch, String>,
}

/// Builds images from locked configurations
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn build(&self, index: &ImageConfiguration) -> Result<BuiltImage, Error>;
}

/// Pushes built artifacts to an OCI registry
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Push the artifact with `digest` to `repository`
    async fn push(&self, repository: &str, digest: &str) -> Result<(), Error>;
}

/// Published references, all of the form `repository@digest`
#[derive(Clone, Debug, Serialize)]
pub struct PublishReport {
    pub reference: String,
    pub archs: BTreeMap<Arch, String>,
}

/// Build the locked index and push every image to `repository`
///
/// Per-architecture images are pushed before the index that references
/// them. Each push is retried with the backoff from `[network]`.
///
/// # Errors
///
/// Returns an error if the repository is invalid, the lock report has
/// error diagnostics, the build fails or misses an architecture, or a push
/// exhausts its retries.
pub async fn build_image(
    ctx: &OpsCtx,
    repository: &str,
    report: &LockReport,
) -> Result<PublishReport, Error> {
    ctx.emit_operation_started("publish");
    let result = build_inner(ctx, repository, report).await;
    match &result {
        Ok(published) => {
            ctx.emit(AppEvent::Publish(PublishEvent::PushCompleted {
                reference: published.reference.clone(),
            }));
            ctx.emit_operation_completed("publish", true);
        }
        Err(e) => {
            ctx.emit(AppEvent::Publish(PublishEvent::Failed {
                failure: FailureContext::from_error(e),
            }));
            ctx.emit_operation_failed("publish", e);
        }
    }
    result
}

async fn build_inner(
    ctx: &OpsCtx,
    repository: &str,
    report: &LockReport,
) -> Result<PublishReport, Error> {
    validate_repository(repository)?;
    report.ensure_locked()?;
    let builder = ctx.builder()?;
    let publisher = ctx.publisher()?;

    ctx.emit(AppEvent::Publish(PublishEvent::BuildStarted {
        config_id: report.id.to_hex(),
        archs: report.index.archs.len(),
    }));
    let built = builder.build(&report.index).await?;
    ctx.emit(AppEvent::Publish(PublishEvent::BuildCompleted {
        digest: built.digest.clone(),
        artifacts: built.archs.len(),
    }));

    let backoff = Backoff::from_config(&ctx.config.network);
    let mut archs = BTreeMap::new();
    for arch in &report.index.archs {
        let digest = built
            .archs
            .get(arch)
            .ok_or_else(|| BuildError::MissingArtifact {
                arch: arch.to_string(),
            })?;
        push(ctx, publisher.as_ref(), backoff, repository, Some(arch), digest).await?;
        archs.insert(arch.clone(), format!("{repository}@{digest}"));
    }
    push(ctx, publisher.as_ref(), backoff, repository, None, &built.digest).await?;

    Ok(PublishReport {
        reference: format!("{repository}@{}", built.digest),
        archs,
    })
}

async fn push(
    ctx: &OpsCtx,
    publisher: &dyn Publisher,
    backoff: Backoff,
    repository: &str,
    arch: Option<&Arch>,
    digest: &str,
) -> Result<(), Error> {
    ctx.emit(AppEvent::Publish(PublishEvent::PushStarted {
        repository: repository.to_string(),
        arch: arch.map(ToString::to_string),
    }));
    retry(
        backoff,
        || publisher.push(repository, digest),
        |attempt, delay, e| {
            tracing::warn!(%repository, %digest, attempt, error = %e, "push failed, retrying");
            ctx.emit(AppEvent::Publish(PublishEvent::PushRetrying {
                repository: repository.to_string(),
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error: e.to_string(),
            }));
        },
    )
    .await
}

/// Accept `[registry[:port]/]path` references without tag or digest
fn validate_repository(repository: &str) -> Result<(), Error> {
    let path = repository
        .split_once('/')
        .map_or(repository, |(_, path)| path);
    let valid = !repository.is_empty()
        && !repository.contains('@')
        && !path.contains(':')
        && !repository.chars().any(char::is_whitespace)
        && path
            .split('/')
            .all(|component| !component.is_empty() && !component.chars().any(char::is_uppercase));
    if valid {
        Ok(())
    } else {
        Err(BuildError::InvalidRepository {
            repository: repository.to_string(),
        }
        .into())
    }
}
