//! Integration tests for resolver crate

#[cfg(test)]
mod tests {
    use apkolock_resolver::*;
    use apkolock_types::{Arch, ArchResolution, ResolvedPackage};
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tempfile::tempdir;

    const RESOLUTIONS: &str = r#"{
        "x86_64": {"packages": [
            {"name": "wolfi-baselayout", "version": "20230201-r0"},
            {"name": "ca-certificates-bundle", "version": "20230506-r0"},
            {"name": "glibc", "version": "2.37-r6", "provides": ["so:libc.so.6=6"]},
            {"name": "glibc-x86-tuning", "version": "1.0-r0"}
        ]},
        "aarch64": {"packages": [
            {"name": "wolfi-baselayout", "version": "20230201-r0"},
            {"name": "ca-certificates-bundle", "version": "20230506-r1"},
            {"name": "glibc", "version": "2.37-r6", "provides": ["so:libc.so.6=6"]}
        ]}
    }"#;

    #[tokio::test]
    async fn test_recorded_fan_out_then_unify() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolutions.json");
        std::fs::write(&path, RESOLUTIONS).unwrap();

        let resolver = RecordedResolver::from_file(&path).await.unwrap();
        let originals = vec![
            "wolfi-baselayout".to_string(),
            "ca-certificates-bundle".to_string(),
            "so:libc.so.6".to_string(),
        ];
        let (tx, _rx) = apkolock_events::channel();
        let resolutions = resolve_all(
            Arc::new(resolver),
            &ResolveRequest::new(&originals),
            &Arch::parse_all(["amd64", "arm64"]),
            &tx,
        )
        .await
        .unwrap();

        let unified = unify(&originals, &resolutions);
        assert_eq!(
            unified.packages,
            vec![
                "ca-certificates-bundle",
                "glibc=2.37-r6",
                "wolfi-baselayout=20230201-r0",
            ]
        );

        let summaries: Vec<_> = unified
            .diagnostics
            .iter()
            .map(|d| (d.is_error(), d.summary.as_str(), d.detail.as_str()))
            .collect();
        assert_eq!(
            summaries,
            vec![
                (
                    true,
                    "Unable to lock package \"ca-certificates-bundle\" to a consistent version",
                    "20230506-r0 (amd64), 20230506-r1 (arm64)",
                ),
                (
                    false,
                    "unable to lock certain packages for amd64",
                    "[glibc-x86-tuning]",
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = RecordedResolver::from_file(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, apkolock_errors::Error::Io { .. }));
    }

    fn resolution_strategy(arch: &'static str) -> impl Strategy<Value = ArchResolution> {
        prop::collection::btree_map(
            prop::sample::select(vec!["foo", "bar", "baz", "bonus", "qux"]),
            (
                prop::sample::select(vec!["1.0-r0", "1.0-r1", "2.0-r0"]),
                prop::collection::btree_set(
                    prop::sample::select(vec!["bar", "cmd:foo", "so:libz.so.1"]),
                    0..3,
                ),
            ),
            0..6,
        )
        .prop_map(move |entries| {
            ArchResolution::from_packages(
                Arch::parse(arch),
                entries.into_iter().map(|(name, (version, provides))| {
                    ResolvedPackage::new(name, version).with_provides(provides)
                }),
            )
        })
    }

    fn originals_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set(
            prop::sample::select(vec!["foo", "bar>1", "baz=1.0-r0", "qux", "ghost"]),
            0..5,
        )
        .prop_map(|set| set.into_iter().map(ToString::to_string).collect())
    }

    proptest! {
        #[test]
        fn unification_ignores_architecture_order(
            originals in originals_strategy(),
            a in resolution_strategy("amd64"),
            b in resolution_strategy("arm64"),
            c in resolution_strategy("riscv64"),
        ) {
            let forward = vec![a.clone(), b.clone(), c.clone()];
            let baseline = unify(&originals, &forward);
            let baseline_warnings: BTreeSet<_> = baseline.diagnostics.warnings().cloned().map(|d| (d.summary, d.detail)).collect();

            for order in [vec![c.clone(), a.clone(), b.clone()], vec![b.clone(), c.clone(), a.clone()], vec![c.clone(), b.clone(), a.clone()]] {
                let got = unify(&originals, &order);
                prop_assert_eq!(&got.packages, &baseline.packages);
                prop_assert_eq!(
                    got.diagnostics.errors().collect::<Vec<_>>(),
                    baseline.diagnostics.errors().collect::<Vec<_>>()
                );
                let warnings: BTreeSet<_> = got.diagnostics.warnings().cloned().map(|d| (d.summary, d.detail)).collect();
                prop_assert_eq!(warnings, baseline_warnings.clone());

                let state = order[1..].iter().fold(UnifiedState::seed(&order[0]), UnifiedState::fold);
                let forward_state = forward[1..].iter().fold(UnifiedState::seed(&forward[0]), UnifiedState::fold);
                prop_assert_eq!(state, forward_state);
            }
        }

        #[test]
        fn pinned_entries_agree_with_every_architecture(
            originals in originals_strategy(),
            a in resolution_strategy("amd64"),
            b in resolution_strategy("arm64"),
        ) {
            let unified = unify(&originals, &[a.clone(), b.clone()]);
            let unpinned = unified.diagnostics.error_count();
            for entry in &unified.packages[unpinned..] {
                let (name, version) = entry.split_once('=').unwrap();
                prop_assert_eq!(a.version(name), Some(version));
                prop_assert_eq!(b.version(name), Some(version));
            }
        }
    }
}
