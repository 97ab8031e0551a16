// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the web chat gateway.
//!
//! This crate provides the error type, the message types exchanged with the
//! internal message bus, and the adapter traits implemented by channels.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WebChatError;
pub use types::{
    ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage, SessionId,
};

pub use traits::{ChannelAdapter, PluginAdapter};
