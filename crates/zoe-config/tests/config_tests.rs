// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Zoe configuration system.

use std::io::Write;

use zoe_config::diagnostic::ConfigError;
use zoe_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_document_deserializes() {
    let toml = r#"
[agent]
name = "kitchen"
log_level = "debug"

[storage]
database_path = "/tmp/zoe-test.db"
wal_mode = false

[timers]
check_interval_ms = 500
offline_ttl_secs = 120
log_callback = false

[modules]
config_paths = ["/srv/zoe/modules.toml"]
search_roots = ["/srv/zoe/modules"]

[metrics]
default_window_hours = 6
top_intents_limit = 3
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.agent.name, "kitchen");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/zoe-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.timers.check_interval_ms, 500);
    assert_eq!(config.timers.offline_ttl_secs, 120);
    assert!(!config.timers.log_callback);
    assert_eq!(config.modules.config_paths, vec!["/srv/zoe/modules.toml"]);
    assert_eq!(config.modules.search_roots, vec!["/srv/zoe/modules"]);
    assert_eq!(config.metrics.default_window_hours, 6);
    assert_eq!(config.metrics.top_intents_limit, 3);
}

#[test]
fn empty_document_uses_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    assert_eq!(config.agent.name, "zoe");
    assert_eq!(config.timers.check_interval_ms, 1000);
    assert_eq!(config.timers.offline_ttl_secs, 3600);
    assert!(config.timers.log_callback);
    assert_eq!(config.metrics.default_window_hours, 24);
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[timers]\ncheck_interval_ms = 50\n").unwrap();
    assert_eq!(config.timers.check_interval_ms, 50);
    assert_eq!(config.timers.offline_ttl_secs, 3600);
}

#[test]
fn typo_in_timers_gets_suggestion() {
    let toml = r#"
[timers]
check_intervl_ms = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "check_intervl_ms" && s == "check_interval_ms"
        )
    });
    assert!(found, "expected a suggestion, got: {errors:?}");
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[scheduler]\nenabled = true\n").unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[timers]\ncheck_interval_ms = \"fast\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_come_back_together() {
    let toml = r#"
[timers]
check_interval_ms = 0
offline_ttl_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn explicit_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[agent]\nname = \"garage\"").unwrap();

    let config = load_and_validate_path(file.path()).expect("file should load");
    assert_eq!(config.agent.name, "garage");
}

#[test]
fn explicit_file_with_typo_reports_key() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[metrics]\ntop_intent_limit = 3").unwrap();

    let errors = load_and_validate_path(file.path()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, .. } if key == "top_intent_limit"
    )));
}
