// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection handles: one per accepted WebSocket.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use webchat_core::WebChatError;

use crate::frame::DeliveryPayload;

/// Write half of a client transport.
#[async_trait]
pub trait FrameSink: Send + Sync + 'static {
    /// Write one text frame.
    async fn send_text(&self, text: String) -> Result<(), WebChatError>;
}

/// [`FrameSink`] over the write half of an axum WebSocket.
///
/// The drain loop and the acknowledgement path share it, so writes are serialized.
pub struct WsFrameSink {
    inner: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsFrameSink {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            inner: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_text(&self, text: String) -> Result<(), WebChatError> {
        let mut sink = self.inner.lock().await;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| WebChatError::Transport {
                message: format!("websocket write failed: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

/// One live transport instance for a session.
///
/// Cheap to clone; clones refer to the same connection. Identity is the
/// connection id, never the session id.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    sink: Arc<dyn FrameSink>,
    drain_cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(sink: Arc<dyn FrameSink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink,
            drain_cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether both handles refer to the same connection.
    pub fn same_as(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }

    /// Serialize and write a payload directly to this connection.
    pub async fn send(&self, payload: &DeliveryPayload) -> Result<(), WebChatError> {
        let text = payload.to_json()?;
        self.sink.send_text(text).await
    }

    /// Token that stops this connection's drain loop.
    pub fn drain_token(&self) -> CancellationToken {
        self.drain_cancel.clone()
    }

    pub fn cancel_drain(&self) {
        self.drain_cancel.cancel();
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("drain_cancelled", &self.drain_cancel.is_cancelled())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::recording_handle;

    #[tokio::test]
    async fn clones_share_identity() {
        let (handle, _sink) = recording_handle();
        let (other, _other_sink) = recording_handle();
        assert!(handle.same_as(&handle.clone()));
        assert!(!handle.same_as(&other));
    }

    #[tokio::test]
    async fn send_writes_json_frame() {
        let (handle, sink) = recording_handle();
        handle
            .send(&crate::frame::DeliveryPayload::Typing)
            .await
            .unwrap();
        assert_eq!(sink.frames(), vec![r#"{"type":"typing"}"#.to_string()]);
    }

    #[tokio::test]
    async fn cancel_drain_is_visible_through_clones() {
        let (handle, _sink) = recording_handle();
        let token = handle.clone().drain_token();
        handle.cancel_drain();
        assert!(token.is_cancelled());
    }
}
