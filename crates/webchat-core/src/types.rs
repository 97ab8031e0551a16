// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the message bus.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key marking an outbound message as an intermediate progress update.
pub const PROGRESS_KEY: &str = "_progress";

/// Metadata key marking an outbound message as a tool-use hint.
pub const TOOL_HINT_KEY: &str = "_tool_hint";

/// Client-generated identifier correlating one browser client to one chat.
///
/// Stable across reconnects. The gateway never invents or destroys it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// A normalized message handed from a channel to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Name of the originating channel.
    pub channel: String,
    pub sender_id: String,
    pub chat_id: String,
    pub content: String,
    /// Absolute filesystem paths or URLs.
    #[serde(default)]
    pub media: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl InboundMessage {
    /// Creates an inbound message stamped with the current time.
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
        media: Vec<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            media,
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Key identifying the conversation this message belongs to.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// A message produced by the bus for delivery through a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Name of the channel that should deliver this message.
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Local filesystem paths or URLs.
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OutboundMessage {
    /// Creates a plain text reply for a chat.
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
            media: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Whether the bus flagged this message as a progress update.
    pub fn is_progress(&self) -> bool {
        self.flag(PROGRESS_KEY)
    }

    /// Whether the bus flagged this message as a tool-use hint.
    pub fn is_tool_hint(&self) -> bool {
        self.flag(TOOL_HINT_KEY)
    }

    /// Metadata flags are truthy: `true`, non-zero numbers, and non-empty
    /// strings, arrays, or objects count as set.
    fn flag(&self, key: &str) -> bool {
        match self.metadata.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapabilities {
    pub supports_typing: bool,
    pub supports_reactions: bool,
    pub supports_media: bool,
    /// Largest accepted upload, if the channel accepts uploads.
    pub max_upload_bytes: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_joins_channel_and_chat() {
        let msg = InboundMessage::new("web", "abc", "abc", "hi", vec![]);
        assert_eq!(msg.session_key(), "web:abc");
    }

    #[test]
    fn outbound_flags_default_to_false() {
        let msg = OutboundMessage::new("web", "abc", "hi");
        assert!(!msg.is_progress());
        assert!(!msg.is_tool_hint());
    }

    #[test]
    fn outbound_flags_read_metadata() {
        let mut msg = OutboundMessage::new("web", "abc", "thinking...");
        msg.metadata.insert(PROGRESS_KEY.into(), Value::Bool(true));
        msg.metadata.insert(TOOL_HINT_KEY.into(), Value::Bool(false));
        assert!(msg.is_progress());
        assert!(!msg.is_tool_hint());
    }

    #[test]
    fn outbound_flags_accept_truthy_values() {
        let flagged = |value: Value| {
            let mut msg = OutboundMessage::new("web", "abc", "working");
            msg.metadata.insert(PROGRESS_KEY.into(), value);
            msg.is_progress()
        };
        assert!(flagged(serde_json::json!(1)));
        assert!(flagged(serde_json::json!("yes")));
        assert!(flagged(serde_json::json!(["step"])));
        assert!(!flagged(serde_json::json!(0)));
        assert!(!flagged(serde_json::json!("")));
        assert!(!flagged(Value::Null));
        assert!(!flagged(serde_json::json!({})));
    }

    #[test]
    fn outbound_deserializes_without_optional_fields() {
        let json = r#"{"channel":"web","chat_id":"s1","content":"hello"}"#;
        let msg: OutboundMessage = serde_json::from_str(json).unwrap();
        assert!(msg.media.is_empty());
        assert!(msg.reply_to.is_none());
        assert!(msg.metadata.is_empty());
    }
}
