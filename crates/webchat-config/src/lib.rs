// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the web chat gateway.
//!
//! Settings come from compiled defaults, then `/etc/webchat/webchat.toml`,
//! the user config file, `./webchat.toml`, and finally `WEBCHAT_*`
//! environment variables. Unknown keys are rejected with a suggestion and
//! every error is reported with a miette diagnostic.
//!
//! ```no_run
//! let config = webchat_config::load_and_validate().expect("config errors");
//! println!("web chat on {}:{}", config.web.host, config.web.port);
//! ```

use std::path::Path;

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::WebChatConfig;

/// Load from the full file hierarchy plus environment and validate.
pub fn load_and_validate() -> Result<WebChatConfig, Vec<ConfigError>> {
    checked(loader::load_config(), hierarchy_sources)
}

/// Load a single file plus environment and validate.
pub fn load_and_validate_path(path: &Path) -> Result<WebChatConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from a TOML string and validate. Environment variables are ignored.
pub fn load_and_validate_str(toml_content: &str) -> Result<WebChatConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a loaded config, or turn the load error into diagnostics using
/// the sources produced by `sources` for spans.
fn checked(
    loaded: Result<WebChatConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<WebChatConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}

/// Every config file in the hierarchy that exists, for span lookup.
fn hierarchy_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG.into());

    [
        Some(Path::new(loader::SYSTEM_CONFIG).to_path_buf()),
        loader::user_config_path(),
        Some(local),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| read_source(&path))
    .collect()
}
