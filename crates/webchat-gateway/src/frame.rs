// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged with the browser.
//!
//! Client -> Server:
//! ```json
//! {"type": "message", "content": "hello", "media": ["/uploads/photo.png"]}
//! ```
//!
//! Server -> Client:
//! ```json
//! {"type": "message", "content": "...", "media": [], "is_progress_msg": false, "is_tool_hint_msg": false}
//! {"type": "reaction", "emoji": "👍"}
//! {"type": "typing"}
//! {"type": "error", "content": "..."}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use webchat_core::WebChatError;

/// The only client frame kind the gateway acts on.
pub const MESSAGE_KIND: &str = "message";

/// Emoji sent back to acknowledge a received message.
pub const ACK_EMOJI: &str = "👍";

/// One outbound event queued for a session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryPayload {
    Message {
        content: String,
        media: Vec<String>,
        is_progress_msg: bool,
        is_tool_hint_msg: bool,
    },
    Reaction {
        emoji: String,
    },
    Typing,
    Error {
        content: String,
    },
}

impl DeliveryPayload {
    /// A plain chat message with no media and no flags.
    pub fn text(content: impl Into<String>) -> Self {
        DeliveryPayload::Message {
            content: content.into(),
            media: Vec::new(),
            is_progress_msg: false,
            is_tool_hint_msg: false,
        }
    }

    /// The acknowledgement reaction sent when a message frame arrives.
    pub fn ack() -> Self {
        DeliveryPayload::Reaction {
            emoji: ACK_EMOJI.to_string(),
        }
    }

    /// Frame kind as it appears in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryPayload::Message { .. } => "message",
            DeliveryPayload::Reaction { .. } => "reaction",
            DeliveryPayload::Typing => "typing",
            DeliveryPayload::Error { .. } => "error",
        }
    }

    /// Serialize to the JSON text written on the wire.
    pub fn to_json(&self) -> Result<String, WebChatError> {
        serde_json::to_string(self).map_err(|e| WebChatError::Internal(format!(
            "failed to serialize {} payload: {e}",
            self.kind()
        )))
    }
}

/// Why a client frame was not accepted.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unrecognized frame kind `{0}`")]
    UnknownKind(String),
}

impl From<FrameError> for WebChatError {
    fn from(e: FrameError) -> Self {
        WebChatError::Protocol(e.to_string())
    }
}

/// A validated frame from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Message { content: String, media: Vec<String> },
}

/// Wire shape before validation. `type` defaults to `message` when absent.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    media: Option<Vec<String>>,
}

impl ClientFrame {
    /// Parse and validate a text frame. Content is trimmed; missing content
    /// or media become empty.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let raw: RawFrame = serde_json::from_str(text)?;
        let kind = raw.kind.unwrap_or_else(|| MESSAGE_KIND.to_string());
        if kind != MESSAGE_KIND {
            return Err(FrameError::UnknownKind(kind));
        }
        Ok(ClientFrame::Message {
            content: raw.content.unwrap_or_default().trim().to_string(),
            media: raw.media.unwrap_or_default(),
        })
    }
}
