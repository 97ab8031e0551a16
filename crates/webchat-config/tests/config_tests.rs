// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use webchat_config::diagnostic::ConfigError;
use webchat_config::model::WebChatConfig;
use webchat_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_webchat_config() {
    let toml = r#"
[agent]
name = "test-agent"
log_level = "debug"

[web]
enabled = true
host = "127.0.0.1"
port = 9000
title = "Test Chat"
allow_from = ["alice", "bob"]
max_upload_size_mb = 1
upload_dir = "/tmp/webchat-media"

[bus]
capacity = 16
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "test-agent");
    assert_eq!(config.agent.log_level, "debug");
    assert!(config.web.enabled);
    assert_eq!(config.web.host, "127.0.0.1");
    assert_eq!(config.web.port, 9000);
    assert_eq!(config.web.title, "Test Chat");
    assert_eq!(config.web.allow_from, vec!["alice", "bob"]);
    assert_eq!(config.web.max_upload_bytes(), 1_048_576);
    assert_eq!(config.web.upload_dir, "/tmp/webchat-media");
    assert_eq!(config.bus.capacity, 16);
}

/// Unknown field in [web] section is rejected.
#[test]
fn unknown_field_in_web_produces_error() {
    let toml = r#"
[web]
prot = 8080
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown key surfaces as an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[web]
prot = 8080
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "prot" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("port"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.name, "webchat");
    assert_eq!(config.agent.log_level, "info");
    assert!(!config.web.enabled);
    assert_eq!(config.web.host, "0.0.0.0");
    assert_eq!(config.web.port, 8088);
    assert_eq!(config.web.title, "Webchat");
    assert!(config.web.allow_from.is_empty());
    assert_eq!(config.web.max_upload_size_mb, 50);
    assert_eq!(config.bus.capacity, 256);
}

/// Wrong value type is reported, not silently defaulted.
#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[web]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "expected a type error, got: {errors:?}"
    );
}

/// Validation runs after successful deserialization.
#[test]
fn validation_errors_surface_from_str_loader() {
    let toml = r#"
[web]
max_upload_size_mb = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero limit should fail validation");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { key, .. } if key == "web.max_upload_size_mb")
    ));
}

/// A dotted override (what `WEBCHAT_WEB_MAX_UPLOAD_SIZE_MB` maps to) beats the TOML value.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[web]
max_upload_size_mb = 10
"#;

    let config: WebChatConfig = Figment::new()
        .merge(Serialized::defaults(WebChatConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("web.max_upload_size_mb", 2))
        .extract()
        .expect("should merge override");

    assert_eq!(config.web.max_upload_size_mb, 2);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    let config = webchat_config::load_config_from_path(std::path::Path::new(
        "/nonexistent/path/webchat.toml",
    ))
    .expect("missing file should be silently skipped");

    assert_eq!(config.agent.name, "webchat");
}

/// The effective config serializes back to TOML (used by `webchat config`).
#[test]
fn config_round_trips_through_toml() {
    let config = WebChatConfig::default();
    let rendered = toml::to_string_pretty(&config).expect("should serialize");
    assert!(rendered.contains("[web]"));
    let parsed = load_config_from_str(&rendered).expect("should parse back");
    assert_eq!(parsed.web.port, config.web.port);
}
