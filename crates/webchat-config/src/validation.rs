// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind hosts, non-empty paths, and positive limits.

use crate::diagnostic::ConfigError;
use crate::model::WebChatConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WebChatConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(invalid(
            "agent.log_level",
            format!(
                "`{}` must be one of: {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    let host = config.web.host.trim();
    if host.is_empty() {
        errors.push(invalid("web.host", "must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(invalid(
                "web.host",
                format!("`{host}` is not a valid IP address or hostname"),
            ));
        }
    }

    if config.web.enabled && config.web.port == 0 {
        errors.push(invalid(
            "web.port",
            "must be non-zero when the web channel is enabled",
        ));
    }

    if config.web.max_upload_size_mb < 1 {
        errors.push(invalid("web.max_upload_size_mb", "must be at least 1"));
    }

    if config.web.upload_dir.trim().is_empty() {
        errors.push(invalid("web.upload_dir", "must not be empty"));
    }

    if config.bus.capacity < 1 {
        errors.push(invalid("bus.capacity", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
