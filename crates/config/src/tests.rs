#[cfg(test)]
mod tests {
    use crate::*;
    use modelstack_common::Error;
    use std::net::Ipv4Addr;
    use std::path::{Path, PathBuf};

    // -- launch command ------------------------------------------------

    #[test]
    fn test_default_launch_round_trip() {
        let cfg = LaunchConfig::default_for("llama-3.2-3b-instruct-q4_k_m.gguf");
        let line = cfg.to_command_line();

        assert!(line.starts_with("python3 -m llama_cpp.server"));
        assert!(line.contains("--model /models/llama-3.2-3b-instruct-q4_k_m.gguf"));
        assert!(line.contains("--host 0.0.0.0"));
        assert!(line.contains("--port 8000"));
        assert!(!line.contains("--n_ctx"));

        let reparsed = LaunchConfig::parse(&line).unwrap();
        assert_eq!(reparsed, cfg);
    }

    #[test]
    fn test_set_model_replaces_value() {
        let mut cfg = LaunchConfig::default_for("a.gguf");
        cfg.set_model(Path::new(CONTAINER_MODEL_ROOT).join("b.gguf"))
            .unwrap();

        assert_eq!(cfg.model_file_name().as_deref(), Some("b.gguf"));

        let line = cfg.to_command_line();
        assert_eq!(line.matches("--model").count(), 1);
        assert!(!line.contains("a.gguf"));
    }

    #[test]
    fn test_set_model_without_flag_is_signalled() {
        let mut cfg = LaunchConfig::parse("python3 -m llama_cpp.server").unwrap();
        let err = cfg
            .set_model(PathBuf::from("/models/a.gguf"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingFlag("--model")));
    }

    #[test]
    fn test_ctx_size_set_replace_remove() {
        let mut cfg = LaunchConfig::default_for("a.gguf");
        assert_eq!(cfg.ctx_size(), None);

        // Absent flag is appended
        cfg.set_ctx_size(Some(8192)).unwrap();
        let line = cfg.to_command_line();
        assert_eq!(line.matches("--n_ctx").count(), 1);
        assert!(line.contains("--n_ctx 8192"));

        // Setting again replaces, never duplicates
        let mut cfg = LaunchConfig::parse(&line).unwrap();
        cfg.set_ctx_size(Some(8192)).unwrap();
        cfg.set_ctx_size(Some(4096)).unwrap();
        let line = cfg.to_command_line();
        assert_eq!(line.matches("--n_ctx").count(), 1);
        assert!(line.contains("--n_ctx 4096"));
        assert!(!line.contains("8192"));

        // "default" removes the flag entirely
        let mut cfg = LaunchConfig::parse(&line).unwrap();
        cfg.set_ctx_size(None).unwrap();
        assert!(!cfg.to_command_line().contains("--n_ctx"));
    }

    #[test]
    fn test_zero_ctx_size_rejected() {
        let mut cfg = LaunchConfig::default_for("a.gguf");
        let err = cfg.set_ctx_size(Some(0)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // Record unchanged
        assert_eq!(cfg.ctx_size(), None);
    }

    #[test]
    fn test_duplicate_flags_are_integrity_errors() {
        for doc in [
            "server --model /a.gguf --model /b.gguf",
            "server --model /a.gguf --n_ctx 1024 --n_ctx 2048",
            "server --port 8000 --port 9000",
        ] {
            let err = LaunchConfig::parse(doc).unwrap_err();
            assert!(matches!(err, Error::Integrity(_)), "doc: {doc}");
        }
    }

    #[test]
    fn test_malformed_launch_documents() {
        let err = LaunchConfig::parse("server --n_ctx lots").unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));

        let err = LaunchConfig::parse("server --model").unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));

        let err = LaunchConfig::parse("server \"unterminated").unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn test_paths_with_spaces_survive_round_trip() {
        let mut cfg = LaunchConfig::default_for("a.gguf");
        cfg.set_model(PathBuf::from("/models/my model v2.gguf"))
            .unwrap();

        let line = cfg.to_command_line();
        assert!(line.contains("\"/models/my model v2.gguf\""));

        let reparsed = LaunchConfig::parse(&line).unwrap();
        assert_eq!(
            reparsed.model_file_name().as_deref(),
            Some("my model v2.gguf")
        );
        assert_eq!(reparsed, cfg);
    }

    #[test]
    fn test_unknown_flags_preserved() {
        let doc = "python3 -m llama_cpp.server --model /models/a.gguf --verbose true\n";
        let cfg = LaunchConfig::parse(doc).unwrap();
        let line = cfg.to_command_line();
        assert!(line.contains("--verbose true"));

        // Still preserved after a mutation
        let mut cfg = LaunchConfig::parse(&line).unwrap();
        cfg.set_ctx_size(Some(2048)).unwrap();
        assert!(cfg.to_command_line().contains("--verbose true"));
    }

    // -- whitelist document --------------------------------------------

    #[test]
    fn test_default_whitelist() {
        let doc = WhitelistDoc::default_document();
        assert_eq!(doc.state(), WhitelistState::Enabled);
        assert_eq!(doc.entries(), vec![Ipv4Addr::new(127, 0, 0, 1)]);
    }

    #[test]
    fn test_add_entry_is_idempotent() {
        let mut doc = WhitelistDoc::default_document();
        let ip = Ipv4Addr::new(10, 0, 0, 5);

        assert_eq!(doc.add_entry(ip), AddOutcome::Added);
        assert_eq!(doc.add_entry(ip), AddOutcome::AlreadyPresent);

        let entries = doc.entries();
        assert_eq!(
            entries,
            vec![Ipv4Addr::new(127, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 5)]
        );
        assert_eq!(doc.as_str().matches("10.0.0.5").count(), 1);
    }

    #[test]
    fn test_add_entry_preserves_foreign_lines() {
        let mut doc = WhitelistDoc::new(
            "# office subnet below\nenforce = on\nallow = 192.168.1.2\n# keep me\n".to_string(),
        );
        doc.add_entry(Ipv4Addr::new(192, 168, 1, 3));

        let text = doc.as_str();
        assert!(text.contains("# office subnet below"));
        assert!(text.contains("# keep me"));
        // New entry sits right after the existing one
        let entry_pos = text.find("allow = 192.168.1.2").unwrap();
        let new_pos = text.find("allow = 192.168.1.3").unwrap();
        assert!(new_pos > entry_pos);
        assert!(new_pos < text.find("# keep me").unwrap());
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut doc = WhitelistDoc::default_document();
        doc.add_entry(Ipv4Addr::new(10, 0, 0, 5));
        let original = doc.as_str().to_string();
        let original_entries = doc.entries();

        assert_eq!(doc.toggle().unwrap(), ToggleOutcome::NowDisabled);
        assert_eq!(doc.state(), WhitelistState::Disabled);
        // Disabling comments the marker out; the entry list is untouched
        assert_eq!(doc.entries(), original_entries);

        assert_eq!(doc.toggle().unwrap(), ToggleOutcome::NowEnabled);
        assert_eq!(doc.state(), WhitelistState::Enabled);
        assert_eq!(doc.as_str(), original);
    }

    #[test]
    fn test_toggle_on_unknown_state_changes_nothing() {
        let text = "allow = 127.0.0.1\n# some hand-edited file\n".to_string();
        let mut doc = WhitelistDoc::new(text.clone());
        assert_eq!(doc.state(), WhitelistState::Unknown);

        let err = doc.toggle().unwrap_err();
        assert!(matches!(err, Error::WhitelistStateUnknown));
        assert_eq!(doc.as_str(), text);
    }

    #[test]
    fn test_unparseable_entries_are_skipped_not_fatal() {
        let doc = WhitelistDoc::new(
            "enforce = on\nallow = 127.0.0.1\nallow = not-an-address\n".to_string(),
        );
        assert_eq!(doc.entries(), vec![Ipv4Addr::new(127, 0, 0, 1)]);
    }

    // -- inventory ------------------------------------------------------

    #[test]
    fn test_inventory_lists_sorted_models() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta.gguf", "alpha.gguf", "notes.txt", "upper.GGUF"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let inventory = ModelInventory::new(dir.path().to_path_buf());
        assert_eq!(
            inventory.list().unwrap(),
            vec!["alpha.gguf", "upper.GGUF", "zeta.gguf"]
        );
        assert!(inventory.contains("alpha.gguf").unwrap());
        assert!(!inventory.contains("notes.txt").unwrap());
    }

    #[test]
    fn test_inventory_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = ModelInventory::new(dir.path().join("nope"));
        assert!(matches!(inventory.list(), Err(Error::NotFound(_))));
    }

    // -- paths and document store ---------------------------------------

    #[test]
    fn test_paths_derive_from_root() {
        let paths = InstallPaths::at(PathBuf::from("/srv/modelstack"));
        assert_eq!(paths.model_dir(), Path::new("/srv/modelstack/models"));
        assert_eq!(paths.ui_data_dir(), Path::new("/srv/modelstack/ui-data"));
        assert_eq!(
            paths.launch_file(),
            Path::new("/srv/modelstack/launch.conf")
        );
        assert_eq!(
            paths.model_path("a.gguf"),
            Path::new("/srv/modelstack/models/a.gguf")
        );
    }

    #[test]
    fn test_store_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.conf");

        store::save_atomic(&path, "contents\n").unwrap();
        assert_eq!(store::load(&path).unwrap(), "contents\n");

        // Overwrite leaves no temp file behind
        store::save_atomic(&path, "updated\n").unwrap();
        assert_eq!(store::load(&path).unwrap(), "updated\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let missing = dir.path().join("absent.conf");
        assert!(matches!(store::load(&missing), Err(Error::NotFound(_))));
    }
}
