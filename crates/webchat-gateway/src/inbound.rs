// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound frame handling: validate, acknowledge, resolve media, forward.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use webchat_core::{InboundMessage, WebChatError};

use crate::connection::ConnectionHandle;
use crate::frame::{ClientFrame, DeliveryPayload};
use crate::media::MediaBridge;

/// What happened to one client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Normalized and handed to the bus.
    Forwarded,
    /// Malformed or of an unrecognized kind; silently discarded.
    Ignored,
    /// Sender is not in the allow list.
    Denied,
}

/// Turns text frames from one channel's clients into [`InboundMessage`]s.
#[derive(Clone)]
pub struct InboundHandler {
    channel: String,
    media: Arc<MediaBridge>,
    allow_from: Arc<HashSet<String>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
}

impl InboundHandler {
    pub fn new(
        channel: impl Into<String>,
        media: Arc<MediaBridge>,
        allow_from: impl IntoIterator<Item = String>,
        inbound_tx: mpsc::Sender<InboundMessage>,
    ) -> Self {
        Self {
            channel: channel.into(),
            media,
            allow_from: Arc::new(allow_from.into_iter().collect()),
            inbound_tx,
        }
    }

    /// Empty allow list means everyone is allowed.
    pub fn is_allowed(&self, sender_id: &str) -> bool {
        self.allow_from.is_empty() || self.allow_from.contains(sender_id)
    }

    /// Handle one text frame received on `handle` for `session_id`.
    ///
    /// Frames that are not valid `message` frames are dropped without any
    /// reply. A valid frame is acknowledged on the same connection with a
    /// reaction before it is forwarded; that write is best effort and its
    /// failure is ignored. Errors only when the bus is gone.
    pub async fn handle(
        &self,
        session_id: &str,
        handle: &ConnectionHandle,
        text: &str,
    ) -> Result<FrameOutcome, WebChatError> {
        let (content, media) = match ClientFrame::parse(text) {
            Ok(ClientFrame::Message { content, media }) => (content, media),
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "ignoring client frame");
                return Ok(FrameOutcome::Ignored);
            }
        };

        if let Err(e) = handle.send(&DeliveryPayload::ack()).await {
            debug!(session_id = %session_id, error = %e, "acknowledgement not delivered");
        }

        if !self.is_allowed(session_id) {
            warn!(session_id = %session_id, channel = %self.channel, "sender not in allow list, dropping message");
            return Ok(FrameOutcome::Denied);
        }

        let media = self.media.resolve_inbound(&media);
        let msg = InboundMessage::new(&self.channel, session_id, session_id, content, media);

        self.inbound_tx
            .send(msg)
            .await
            .map_err(|_| WebChatError::Bus("inbound channel closed".to_string()))?;
        Ok(FrameOutcome::Forwarded)
    }
}
