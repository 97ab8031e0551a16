// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the web chat gateway.

use thiserror::Error;

/// The primary error type used across the gateway, bus, and adapter traits.
#[derive(Debug, Error)]
pub enum WebChatError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Read or write failure on a live client connection.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A client frame was malformed or of an unrecognized kind.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// An upload exceeded the configured size limit.
    #[error("upload of {size} bytes exceeds limit of {limit} bytes")]
    UploadTooLarge { size: usize, limit: usize },

    /// A media file could not be found (download, or outbound local path).
    #[error("media not found: {0}")]
    MediaNotFound(String),

    /// Filesystem errors while storing or reading media.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Required runtime support is absent; the channel stays inactive.
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// The message bus is closed or rejected a message.
    #[error("bus error: {0}")]
    Bus(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for WebChatError {
    fn from(e: std::io::Error) -> Self {
        WebChatError::Storage {
            source: Box::new(e),
        }
    }
}
