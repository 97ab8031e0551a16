// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for client-facing messaging surfaces.

use async_trait::async_trait;

use crate::error::WebChatError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging channel integrations.
///
/// A channel normalizes client input into [`InboundMessage`]s for the bus and
/// delivers the bus's [`OutboundMessage`]s back to the right client.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Starts the channel (binds listeners, prepares storage).
    async fn connect(&mut self) -> Result<(), WebChatError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WebChatError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, WebChatError>;

    /// Shows a typing indicator in the given chat. Channels without typing
    /// support keep the default no-op.
    async fn send_typing(&self, _chat_id: &str) -> Result<(), WebChatError> {
        Ok(())
    }
}
