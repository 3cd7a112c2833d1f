//! Integration tests for types

#[cfg(test)]
mod tests {
    use apkolock_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_arch_serialization() {
        let arch = Arch::parse("aarch64");
        let json = serde_json::to_string(&arch).unwrap();
        assert_eq!(json, r#""arm64""#);

        let deserialized: Arch = serde_json::from_str(r#""aarch64""#).unwrap();
        assert_eq!(deserialized, arch);
    }

    #[test]
    fn test_output_format_default() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt, OutputFormat::Tty);
    }

    #[test]
    fn test_diagnostics_serialize_as_list() {
        let diags: Diagnostics = vec![Diagnostic::warning("w", "d")].into();
        let json = serde_json::to_value(&diags).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"severity": "warning", "summary": "w", "detail": "d"}])
        );
    }

    proptest! {
        #[test]
        fn package_spec_reassembles_input(input in "[a-z0-9:._+-]{0,12}([=<>~][=<>~a-z0-9._-]{0,8})?") {
            let spec = PackageSpec::parse(&input);
            prop_assert_eq!(spec.to_string(), input.clone());
            prop_assert!(!spec.name.contains(['=', '<', '>', '~']));
        }
    }
}
