//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use apkolock_config::{Config, ImageRequest};
    use apkolock_errors::{BuildError, Error, OpsError};
    use apkolock_events::{AppEvent, EventReceiver, LockEvent, PublishEvent};
    use apkolock_ops::*;
    use apkolock_resolver::RecordedResolver;
    use apkolock_types::{Arch, ArchResolution, ImageConfiguration, ResolvedPackage};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    const IMAGE: &str = r"
contents:
  repositories:
    - https://packages.wolfi.dev/os
  packages:
    - busybox
    - tzdata
archs:
  - x86_64
  - aarch64
";

    fn recorded() -> RecordedResolver {
        RecordedResolver::from_resolutions([
            ArchResolution::from_packages(
                Arch::parse("amd64"),
                [
                    ResolvedPackage::new("busybox", "1.36.1-r0"),
                    ResolvedPackage::new("tzdata", "2023c-r1"),
                    ResolvedPackage::new("glibc-x86-tuning", "1.0-r0"),
                ],
            ),
            ArchResolution::from_packages(
                Arch::parse("arm64"),
                [
                    ResolvedPackage::new("busybox", "1.36.1-r0"),
                    ResolvedPackage::new("tzdata", "2023c-r2"),
                ],
            ),
        ])
    }

    fn agreeing() -> RecordedResolver {
        let packages = || {
            [
                ResolvedPackage::new("busybox", "1.36.1-r0"),
                ResolvedPackage::new("tzdata", "2023c-r1"),
            ]
        };
        RecordedResolver::from_resolutions([
            ArchResolution::from_packages(Arch::parse("amd64"), packages()),
            ArchResolution::from_packages(Arch::parse("arm64"), packages()),
        ])
    }

    fn context(resolver: RecordedResolver, config: Config) -> (OpsCtx, EventReceiver) {
        let (tx, rx) = apkolock_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_resolver(Arc::new(resolver))
            .with_event_sender(tx)
            .with_config(config)
            .with_correlation_id("test-run")
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            events.push(message.event);
        }
        events
    }

    fn image() -> ImageConfiguration {
        ImageConfiguration::from_yaml(IMAGE).unwrap()
    }

    #[test]
    fn test_builder_requires_resolver() {
        let (tx, _rx) = apkolock_events::channel();
        let result = OpsContextBuilder::new().with_event_sender(tx).build();
        assert!(matches!(
            result,
            Err(Error::Ops(OpsError::MissingComponent { .. }))
        ));
    }

    #[tokio::test]
    async fn test_lock_reports_conflicts() {
        let (ctx, mut rx) = context(recorded(), Config::default());
        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();

        assert_eq!(report.index.contents.packages, vec!["tzdata", "busybox=1.36.1-r0"]);
        assert_eq!(report.index.archs, Arch::parse_all(["amd64", "arm64"]));

        let diagnostics: Vec<_> = report.diagnostics.iter().collect();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].is_error());
        assert_eq!(
            diagnostics[0].summary,
            "Unable to lock package \"tzdata\" to a consistent version"
        );
        assert_eq!(diagnostics[0].detail, "2023c-r1 (amd64), 2023c-r2 (arm64)");
        assert_eq!(diagnostics[1].summary, "unable to lock certain packages for amd64");
        assert_eq!(diagnostics[1].detail, "[glibc-x86-tuning]");

        let amd64 = &report.archs[&Arch::parse("amd64")];
        assert_eq!(amd64.archs, vec![Arch::parse("amd64")]);
        assert_eq!(
            amd64.contents.packages,
            vec![
                "busybox=1.36.1-r0",
                "glibc-x86-tuning=1.0-r0",
                "tzdata=2023c-r1"
            ]
        );

        assert!(matches!(
            report.ensure_locked(),
            Err(Error::Ops(OpsError::LockFailed { count: 1 }))
        ));

        let events = drain(&mut rx);
        let lock_diagnostics = events
            .iter()
            .filter(|e| matches!(e, AppEvent::Lock(LockEvent::Diagnostic { .. })))
            .count();
        assert_eq!(lock_diagnostics, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Lock(LockEvent::Completed {
                errors: 1,
                warnings: 1,
                ..
            })
        )));
    }

    #[tokio::test]
    async fn test_lock_events_carry_correlation_id() {
        let (ctx, mut rx) = context(agreeing(), Config::default());
        lock(&ctx, image(), &ImageRequest::default()).await.unwrap();

        let mut lock_events = 0;
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Lock(_) = message.event {
                assert_eq!(message.meta.correlation_id.as_deref(), Some("test-run"));
                lock_events += 1;
            }
        }
        assert!(lock_events > 0);
    }

    #[tokio::test]
    async fn test_lock_applies_provider_defaults() {
        let mut config = Config::default();
        config.provider.extra_packages = vec!["busybox".into(), "tzdata".into()];
        config.provider.default_archs = Arch::parse_all(["arm64"]);
        let (ctx, _rx) = context(agreeing(), config);

        let report = lock(&ctx, ImageConfiguration::default(), &ImageRequest::default())
            .await
            .unwrap();
        assert_eq!(report.index.archs, Arch::parse_all(["arm64"]));
        assert_eq!(
            report.index.contents.packages,
            vec!["busybox=1.36.1-r0", "tzdata=2023c-r1"]
        );
        assert!(report.diagnostics.is_empty());
        assert!(report.ensure_locked().is_ok());
    }

    #[tokio::test]
    async fn test_lock_writes_snapshots() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.general.out_dir = Some(dir.path().join("out"));
        let (ctx, mut rx) = context(agreeing(), config);

        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();

        let out = dir.path().join("out");
        let pre = std::fs::read_to_string(snapshot_path(&out, &report.id, "pre")).unwrap();
        let post = std::fs::read_to_string(snapshot_path(&out, &report.id, "post")).unwrap();
        let pre: ImageConfiguration = serde_json::from_str(&pre).unwrap();
        let post: ImageConfiguration = serde_json::from_str(&post).unwrap();
        assert_eq!(pre.contents.packages, vec!["busybox", "tzdata"]);
        assert_eq!(post, report.index);

        let written = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, AppEvent::Lock(LockEvent::SnapshotWritten { .. })))
            .count();
        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn test_lock_unknown_arch_fails() {
        let (ctx, _rx) = context(recorded(), Config::default());
        let ic = ImageConfiguration::from_yaml("contents:\n  packages: [busybox]\narchs: [s390x]\n")
            .unwrap();
        let err = lock(&ctx, ic, &ImageRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
    }

    #[tokio::test]
    async fn test_version_tags() {
        let (ctx, mut rx) = context(agreeing(), Config::default());
        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();

        let tags = version_tags(&ctx, &report.index, "busybox").unwrap();
        assert_eq!(tags.version.as_deref(), Some("1.36.1-r0"));
        assert_eq!(tags.tags, vec!["1", "1.36", "1.36.1", "1.36.1-r0"]);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, AppEvent::Lock(LockEvent::TagsComputed { .. }))));
    }

    #[tokio::test]
    async fn test_version_tags_disabled() {
        let mut config = Config::default();
        config.general.disable_version_tags = true;
        let (ctx, mut rx) = context(agreeing(), config);

        // Unpinned entries are not even inspected when tags are disabled
        let tags = version_tags(&ctx, &image(), "busybox").unwrap();
        assert!(tags.tags.is_empty());
        assert!(tags.version.is_none());
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::General(apkolock_events::GeneralEvent::Warning { message, .. })
                if message == "Version tags disabled"
        )));
    }

    struct FakeBuilder {
        archs: Vec<&'static str>,
    }

    #[async_trait]
    impl ImageBuilder for FakeBuilder {
        async fn build(&self, _index: &ImageConfiguration) -> Result<BuiltImage, Error> {
            Ok(BuiltImage {
                digest: "sha256:index".into(),
                archs: self
                    .archs
                    .iter()
                    .map(|a| (Arch::parse(a), format!("sha256:{a}")))
                    .collect::<BTreeMap<_, _>>(),
            })
        }
    }

    #[derive(Default)]
    struct FlakyPublisher {
        failures: AtomicU32,
        pushed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Publisher for FlakyPublisher {
        async fn push(&self, repository: &str, digest: &str) -> Result<(), Error> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(BuildError::PushFailed {
                    repository: repository.into(),
                    message: "connection reset".into(),
                }
                .into());
            }
            self.pushed.lock().unwrap().push(digest.to_string());
            Ok(())
        }
    }

    async fn locked_context(
        builder: FakeBuilder,
        publisher: Arc<FlakyPublisher>,
    ) -> (OpsCtx, EventReceiver, LockReport) {
        let (tx, rx) = apkolock_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_resolver(Arc::new(agreeing()))
            .with_builder(Arc::new(builder))
            .with_publisher(publisher)
            .with_event_sender(tx)
            .build()
            .unwrap();
        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();
        (ctx, rx, report)
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_image_pushes_archs_then_index() {
        let publisher = Arc::new(FlakyPublisher {
            failures: AtomicU32::new(1),
            ..FlakyPublisher::default()
        });
        let builder = FakeBuilder {
            archs: vec!["amd64", "arm64"],
        };
        let (ctx, mut rx, report) = locked_context(builder, Arc::clone(&publisher)).await;

        let published = build_image(&ctx, "registry.example.com/app", &report)
            .await
            .unwrap();
        assert_eq!(published.reference, "registry.example.com/app@sha256:index");
        assert_eq!(
            published.archs[&Arch::parse("arm64")],
            "registry.example.com/app@sha256:arm64"
        );
        assert_eq!(
            *publisher.pushed.lock().unwrap(),
            vec!["sha256:amd64", "sha256:arm64", "sha256:index"]
        );

        let retries: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Publish(PublishEvent::PushRetrying {
                    attempt, delay_ms, ..
                }) => Some((attempt, delay_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(retries, vec![(1, 5000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_image_gives_up() {
        let publisher = Arc::new(FlakyPublisher {
            failures: AtomicU32::new(10),
            ..FlakyPublisher::default()
        });
        let builder = FakeBuilder {
            archs: vec!["amd64", "arm64"],
        };
        let (ctx, _rx, report) = locked_context(builder, Arc::clone(&publisher)).await;

        let err = build_image(&ctx, "registry.example.com/app", &report)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ops(OpsError::RetriesExhausted { attempts: 3, .. })
        ));
        assert!(publisher.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_image_missing_artifact() {
        let publisher = Arc::new(FlakyPublisher::default());
        let builder = FakeBuilder {
            archs: vec!["amd64"],
        };
        let (ctx, _rx, report) = locked_context(builder, Arc::clone(&publisher)).await;

        let err = build_image(&ctx, "registry.example.com/app", &report)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::MissingArtifact { ref arch }) if arch == "arm64"
        ));
    }

    #[tokio::test]
    async fn test_build_image_requires_clean_lock() {
        let (ctx, _rx) = context(recorded(), Config::default());
        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();
        let err = build_image(&ctx, "registry.example.com/app", &report)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::LockFailed { .. })));

        let err = build_image(&ctx, "registry.example.com/app:latest", &report)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::InvalidRepository { .. })));
    }

    #[tokio::test]
    async fn test_operation_result_json() {
        let (ctx, _rx) = context(agreeing(), Config::default());
        let report = lock(&ctx, image(), &ImageRequest::default())
            .await
            .unwrap();
        let result = OperationResult::LockReport(report);
        assert!(result.is_success());

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "LockReport");
        assert_eq!(
            json["data"]["archs"]["arm64"]["archs"],
            serde_json::json!(["arm64"])
        );
        assert_eq!(json["data"]["id"].as_str().unwrap().len(), 64);
    }

    const PLAN: &str = r"
versions:
  ordered_keys: [php-8.3, php-8.2]
  versions:
    php-8.2:
      version: '8.2'
      main: php-8.2
      exists: true
      lts: '2026-12-31'
      release_date: '2022-12-08'
    php-8.3:
      version: '8.3'
      main: php-8.3
      exists: true
      is_latest: true
      fips: true
configs:
  php-8.3-fpm:
    component: fpm
    main: php-8.3-fpm
    config:
      contents:
        packages: [php-8.3-fpm]
    locked:
      contents:
        packages: [php-8.3-fpm=8.3.1-r0, php-8.3=8.3.1-r0]
  php-8.2:
    component: cli
    config:
      contents:
        packages: [php-8.2]
    locked:
      contents:
        packages: [php-8.2=8.2.11-r1]
  nginx:
    config:
      contents:
        packages: [nginx]
";

    #[tokio::test]
    async fn test_resolve_streams() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("streams");
        let mut config = Config::default();
        config.general.out_dir = Some(out.clone());
        let (ctx, mut rx) = context(agreeing(), config);

        let plan = apkolock_types::StreamPlan::from_yaml(PLAN).unwrap();
        let report = resolve_streams(&ctx, &plan).await.unwrap();

        let fpm = &report.resolved["php-8.3-fpm"];
        assert_eq!(fpm.version_stream_name, "php-8.3");
        assert_eq!(fpm.component, "fpm");
        assert_eq!(fpm.stream.main, "php-8.3-fpm");
        assert!(fpm.stream.fips);
        assert_eq!(fpm.tags, vec!["8", "8.3", "8.3.1", "8.3.1-r0", "latest"]);

        let cli = &report.resolved["php-8.2"];
        assert_eq!(cli.stream.main, "php-8.2");
        assert_eq!(cli.stream.lts, "2026-12-31");
        assert_eq!(cli.stream.release_date, "2022-12-08");
        assert_eq!(cli.tags, vec!["8", "8.2", "8.2.11", "8.2.11-r1"]);

        assert_eq!(report.unmatched, vec!["nginx"]);

        let resolved = std::fs::read_to_string(stream_output_path(
            &out,
            "php-8.3",
            "php-8.3-fpm",
            "resolved",
        ))
        .unwrap();
        assert_eq!(
            ImageConfiguration::from_yaml(&resolved).unwrap(),
            plan.configs["php-8.3-fpm"].config
        );
        assert!(stream_output_path(&out, "php-8.2", "php-8.2", "locked").exists());

        let streamed = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, AppEvent::Lock(LockEvent::StreamResolved { .. })))
            .count();
        assert_eq!(streamed, 2);
    }

    #[tokio::test]
    async fn test_resolve_streams_without_lock_has_no_tags() {
        let (ctx, _rx) = context(agreeing(), Config::default());
        let mut plan = apkolock_types::StreamPlan::from_yaml(PLAN).unwrap();
        for component in plan.configs.values_mut() {
            component.locked = None;
        }

        let report = resolve_streams(&ctx, &plan).await.unwrap();
        assert!(report.resolved.values().all(|c| c.tags.is_empty()));
    }

    #[tokio::test]
    async fn test_resolve_streams_disabled_tags_keep_latest() {
        let mut config = Config::default();
        config.general.disable_version_tags = true;
        let (ctx, _rx) = context(agreeing(), config);

        let plan = apkolock_types::StreamPlan::from_yaml(PLAN).unwrap();
        let report = resolve_streams(&ctx, &plan).await.unwrap();
        assert_eq!(report.resolved["php-8.3-fpm"].tags, vec![LATEST_TAG]);
        assert!(report.resolved["php-8.2"].tags.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_streams_missing_main_package() {
        let (ctx, _rx) = context(agreeing(), Config::default());
        let mut plan = apkolock_types::StreamPlan::from_yaml(PLAN).unwrap();
        if let Some(component) = plan.configs.get_mut("php-8.2") {
            component.main = Some("python-3.12".into());
        }

        let err = resolve_streams(&ctx, &plan).await.unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::PackageNotFound { .. })));
    }

    #[test]
    fn test_resolve_streams_from_source() {
        let (ctx, _rx) = context(agreeing(), Config::default());
        let plan = apkolock_types::StreamPlan::from_yaml(PLAN).unwrap();
        let source = apkolock_types::LockSource::from_json(
            r#"{"imageLocks": {"php-8.2": {
                "configs": {"index": "{\"Config\": {\"contents\": {\"packages\": [\"php-8.2=8.2.11-r1\"]}}}"},
                "main": "php-8.2-cli",
                "tags": ["8.2", "8.2.11"]
            }}}"#,
        )
        .unwrap();

        let report = resolve_streams_from_source(&ctx, &plan.versions, &source).unwrap();
        let resolved = &report.resolved["php-8.2"];
        assert_eq!(resolved.resolved.contents.packages, vec!["php-8.2=8.2.11-r1"]);
        assert!(resolved.locked.is_none());
        assert_eq!(resolved.stream.main, "php-8.2-cli");
        assert_eq!(resolved.stream.release_date, "2022-12-08");
        assert_eq!(resolved.tags, vec!["8.2", "8.2.11"]);

        let orphan = apkolock_types::LockSource::from_json(
            r#"{"imageLocks": {"ruby-3.3": {"configs": {"index": "{\"config\": {}}"}}}}"#,
        )
        .unwrap();
        let err = resolve_streams_from_source(&ctx, &plan.versions, &orphan).unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::StreamNotFound { .. })));
    }
}
