// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./webchat.toml` > `~/.config/webchat/webchat.toml` > `/etc/webchat/webchat.toml`
//! with environment variable overrides via `WEBCHAT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WebChatConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/webchat/webchat.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG: &str = "webchat.toml";

/// `~/.config/webchat/webchat.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("webchat/webchat.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/webchat/webchat.toml` (system-wide)
/// 3. `~/.config/webchat/webchat.toml` (user XDG config)
/// 4. `./webchat.toml` (local directory)
/// 5. `WEBCHAT_*` environment variables
pub fn load_config() -> Result<WebChatConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WebChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WebChatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WebChatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WebChatConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WebChatConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `WEBCHAT_WEB_MAX_UPLOAD_SIZE_MB` must map to
/// `web.max_upload_size_mb`, not `web.max.upload.size.mb`.
fn env_provider() -> Env {
    Env::prefixed("WEBCHAT_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["agent", "web", "bus"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("web_max_upload_size_mb"), "web.max_upload_size_mb");
        assert_eq!(map_env_key("agent_log_level"), "agent.log_level");
        assert_eq!(map_env_key("bus_capacity"), "bus.capacity");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("webhook_url"), "webhook_url");
    }
}
