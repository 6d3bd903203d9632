#[cfg(test)]
mod tests {
    use crate::controller::BUILTIN_DEFINITION;
    use crate::stack::StackDefinition;
    use crate::template::{render, Substitutions};
    use crate::update::{parse_header, validate_candidate};
    use modelstack_common::Error;
    use modelstack_config::InstallPaths;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn probe_subs() -> Substitutions {
        Substitutions::for_paths(&InstallPaths::at(PathBuf::from("/probe"))).unwrap()
    }

    // -- template rendering --------------------------------------------

    #[test]
    fn test_render_is_deterministic() {
        let template = "a: \"{{install_dir}}\"\nb: \"{{model_dir}}\"\n";
        let subs = probe_subs();

        let first = render(template, &subs);
        let second = render(template, &subs);

        assert_eq!(first, second);
        assert_eq!(first, "a: \"/probe\"\nb: \"/probe/models\"\n");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let mut subs = Substitutions::new();
        subs.bind("x", "value");
        assert_eq!(render("{{x}} and {{x}}", &subs), "value and value");
    }

    #[test]
    fn test_unmatched_placeholders_left_in_place() {
        let rendered = render("path: \"{{typo_dir}}\"", &probe_subs());
        assert_eq!(rendered, "path: \"{{typo_dir}}\"");
    }

    #[test]
    fn test_binding_escapes_for_quoted_scalars() {
        let mut subs = Substitutions::new();
        subs.bind("x", "a\"b\\c with space");

        let rendered = render("value: \"{{x}}\"", &subs);
        // The rendered document must still be structurally sound YAML
        let parsed: BTreeMap<String, String> = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed["value"], "a\"b\\c with space");
    }

    // -- the built-in definition ---------------------------------------

    #[test]
    fn test_builtin_definition_is_deployable() {
        let version = validate_candidate(BUILTIN_DEFINITION).unwrap();
        assert_eq!(version.to_string(), "0.1.0");

        let rendered = render(BUILTIN_DEFINITION, &probe_subs());
        let stack = StackDefinition::from_rendered(&rendered).unwrap();

        let inference = &stack.services["inference"];
        let webui = &stack.services["webui"];

        assert!(inference.reserves_gpu());
        assert!(!webui.reserves_gpu());
        assert!(inference
            .volumes
            .iter()
            .any(|v| v.starts_with("/probe/models:")));
        assert!(webui
            .volumes
            .iter()
            .any(|v| v.starts_with("/probe/ui-data:")));
        assert_eq!(webui.depends_on, vec!["inference"]);
    }

    // -- stack validation -----------------------------------------------

    #[test]
    fn test_stack_requires_both_services() {
        let doc = r#"
services:
  inference:
    image: x
"#;
        let err = StackDefinition::from_rendered(doc).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert!(err.to_string().contains("webui"));
    }

    #[test]
    fn test_stack_rejects_relative_host_paths() {
        let doc = r#"
services:
  inference:
    image: x
    volumes:
      - "models:/models:ro"
  webui:
    image: y
"#;
        let err = StackDefinition::from_rendered(doc).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert!(err.to_string().contains("not absolute"));
    }

    #[test]
    fn test_stack_rejects_surviving_delimiters() {
        let doc = r#"
services:
  inference:
    image: "{{image}}"
  webui:
    image: y
"#;
        let err = StackDefinition::from_rendered(doc).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn test_stack_rejects_gpu_on_ui_service() {
        let doc = r#"
services:
  inference:
    image: x
  webui:
    image: y
    deploy:
      resources:
        reservations:
          devices:
            - capabilities: ["gpu"]
"#;
        let err = StackDefinition::from_rendered(doc).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert!(err.to_string().contains("gpu"));
    }

    // -- definition headers ---------------------------------------------

    #[test]
    fn test_header_parsing() {
        assert_eq!(
            parse_header("# modelstack-deploy v1.2.3\nservices: {}\n")
                .unwrap()
                .to_string(),
            "1.2.3"
        );

        for bad in [
            "services: {}\n",
            "# modelstack-deploy\n",
            "# modelstack-deploy vnot.a.version\n",
            "",
        ] {
            let err = parse_header(bad).unwrap_err();
            assert!(matches!(err, Error::Integrity(_)), "input: {bad:?}");
        }
    }

    #[test]
    fn test_version_ordering() {
        let v = |s: &str| parse_header(&format!("# modelstack-deploy v{s}\n")).unwrap();
        assert!(v("0.1.0") < v("0.2.0"));
        assert!(v("0.2.0") < v("1.0.0"));
        assert!(v("1.0.0") < v("1.0.10"));
        assert_eq!(v("0.1.0"), v("0.1.0"));
    }

    #[test]
    fn test_candidate_with_header_but_broken_body_rejected() {
        let candidate = "# modelstack-deploy v9.9.9\nservices:\n  inference:\n    image: x\n";
        let err = validate_candidate(candidate).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }
}
