// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the web chat gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebChatConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Web chat channel settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Internal message bus settings.
    #[serde(default)]
    pub bus: BusConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "webchat".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Web chat channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    /// Enable the web chat channel.
    #[serde(default)]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Page title shown by the embedded UI.
    #[serde(default = "default_title")]
    pub title: String,

    /// Session ids allowed to talk to the agent. Empty allows everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,

    /// Largest accepted upload in MiB.
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,

    /// Directory that holds uploaded and bridged media.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

impl WebConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            title: default_title(),
            allow_from: Vec::new(),
            max_upload_size_mb: default_max_upload_size_mb(),
            upload_dir: default_upload_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8088
}

fn default_title() -> String {
    "Webchat".to_string()
}

fn default_max_upload_size_mb() -> u64 {
    50
}

fn default_upload_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("webchat").join("media"))
        .unwrap_or_else(|| std::path::PathBuf::from("media"))
        .display()
        .to_string()
}

/// Message bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Capacity of the inbound and outbound bus queues.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

fn default_bus_capacity() -> usize {
    256
}
