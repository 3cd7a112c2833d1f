//! Concurrent per-architecture resolution

use crate::{PackageResolver, ResolveRequest};
use apkolock_errors::{Error, ResolveError};
use apkolock_events::{AppEvent, EventEmitter, EventSender, FailureContext, ResolverEvent};
use apkolock_types::{Arch, ArchResolution};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Resolve `request` for every architecture concurrently
///
/// One task is spawned per architecture. The first failure is returned and
/// the remaining tasks are aborted when the task set is dropped, as they are
/// when the returned future itself is dropped. Results come back in the
/// order of `archs`.
///
/// # Errors
///
/// Returns `ResolveError::NoArchitectures` for an empty architecture list,
/// or the first resolution error any architecture produced.
pub async fn resolve_all(
    resolver: Arc<dyn PackageResolver>,
    request: &ResolveRequest,
    archs: &[Arch],
    tx: &EventSender,
) -> Result<Vec<ArchResolution>, Error> {
    if archs.is_empty() {
        return Err(ResolveError::NoArchitectures.into());
    }

    let started = Instant::now();
    tx.emit(AppEvent::Resolver(ResolverEvent::FanOutStarted {
        archs: archs.iter().map(ToString::to_string).collect(),
        requested: request.packages.len(),
    }));

    let request = Arc::new(request.clone());
    let mut tasks = JoinSet::new();
    for (index, arch) in archs.iter().cloned().enumerate() {
        let resolver = Arc::clone(&resolver);
        let request = Arc::clone(&request);
        let tx = tx.clone();

        tasks.spawn(async move {
            let begin = Instant::now();
            tx.emit(AppEvent::Resolver(ResolverEvent::ArchStarted {
                arch: arch.to_string(),
            }));

            let result = resolver
                .resolve(&arch, &request)
                .await
                .and_then(|resolution| check_arch(&arch, resolution));
            match &result {
                Ok(resolution) => tx.emit(AppEvent::Resolver(ResolverEvent::ArchCompleted {
                    arch: arch.to_string(),
                    packages: resolution.len(),
                    duration_ms: elapsed_ms(begin),
                })),
                Err(e) => tx.emit(AppEvent::Resolver(ResolverEvent::ArchFailed {
                    arch: arch.to_string(),
                    failure: FailureContext::from_error(e),
                })),
            }
            result.map(|resolution| (index, resolution))
        });
    }

    let mut results = Vec::with_capacity(archs.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(indexed)) => results.push(indexed),
            Ok(Err(e)) => return Err(e),
            Err(e) if e.is_cancelled() => return Err(Error::Cancelled),
            Err(e) => {
                return Err(ResolveError::TaskFailed {
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    results.sort_by_key(|(index, _)| *index);
    tx.emit(AppEvent::Resolver(ResolverEvent::FanOutCompleted {
        archs: results.len(),
        duration_ms: elapsed_ms(started),
    }));
    Ok(results.into_iter().map(|(_, resolution)| resolution).collect())
}

fn check_arch(arch: &Arch, resolution: ArchResolution) -> Result<ArchResolution, Error> {
    if resolution.arch() == arch {
        Ok(resolution)
    } else {
        Err(ResolveError::InvalidData {
            message: format!(
                "resolver answered for {} when asked for {arch}",
                resolution.arch()
            ),
        }
        .into())
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordedResolver;
    use apkolock_types::ResolvedPackage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn recorded(archs: &[&str]) -> Arc<dyn PackageResolver> {
        Arc::new(RecordedResolver::from_resolutions(archs.iter().map(|arch| {
            ArchResolution::new(Arch::parse(arch)).with(ResolvedPackage::new("foo", "1.0"))
        })))
    }

    #[tokio::test]
    async fn test_results_follow_requested_order() {
        let (tx, _rx) = apkolock_events::channel();
        let archs = Arch::parse_all(["arm64", "amd64", "riscv64"]);
        let results = resolve_all(
            recorded(&["amd64", "arm64", "riscv64"]),
            &ResolveRequest::new(&["foo".to_string()]),
            &archs,
            &tx,
        )
        .await
        .unwrap();

        let order: Vec<_> = results.iter().map(|r| r.arch().as_str()).collect();
        assert_eq!(order, vec!["arm64", "amd64", "riscv64"]);
    }

    #[tokio::test]
    async fn test_no_architectures() {
        let (tx, _rx) = apkolock_events::channel();
        let err = resolve_all(recorded(&[]), &ResolveRequest::default(), &[], &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolve(ResolveError::NoArchitectures)));
    }

    struct SlowUnlessAmd64 {
        finished: AtomicUsize,
    }

    #[async_trait]
    impl PackageResolver for SlowUnlessAmd64 {
        async fn resolve(
            &self,
            arch: &Arch,
            _request: &ResolveRequest,
        ) -> Result<ArchResolution, Error> {
            if arch.as_str() == "amd64" {
                return Err(ResolveError::Failed {
                    arch: arch.to_string(),
                    message: "index unavailable".into(),
                }
                .into());
            }
            tokio::time::sleep(Duration::from_secs(3600)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ArchResolution::new(arch.clone()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_aborts_fan_out() {
        let (tx, mut rx) = apkolock_events::channel();
        let resolver = Arc::new(SlowUnlessAmd64 {
            finished: AtomicUsize::new(0),
        });
        let archs = Arch::parse_all(["arm64", "amd64", "s390x"]);

        let err = resolve_all(resolver.clone(), &ResolveRequest::default(), &archs, &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolve(ResolveError::Failed { .. })));

        tokio::time::advance(Duration::from_secs(7200)).await;
        assert_eq!(resolver.finished.load(Ordering::SeqCst), 0);

        let mut saw_failure = false;
        while let Ok(message) = rx.try_recv() {
            if matches!(
                message.event,
                AppEvent::Resolver(ResolverEvent::ArchFailed { .. })
            ) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    struct WrongArch;

    #[async_trait]
    impl PackageResolver for WrongArch {
        async fn resolve(
            &self,
            _arch: &Arch,
            _request: &ResolveRequest,
        ) -> Result<ArchResolution, Error> {
            Ok(ArchResolution::new(Arch::parse("ppc64le")))
        }
    }

    #[tokio::test]
    async fn test_mismatched_arch_rejected() {
        let (tx, _rx) = apkolock_events::channel();
        let err = resolve_all(
            Arc::new(WrongArch),
            &ResolveRequest::default(),
            &[Arch::parse("amd64")],
            &tx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Resolve(ResolveError::InvalidData { .. })));
    }
}
