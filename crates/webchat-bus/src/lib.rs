// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process message bus.
//!
//! Channels publish normalized [`InboundMessage`]s for the agent to consume;
//! the agent publishes [`OutboundMessage`]s that the [`OutboundDispatcher`]
//! routes back to the channel named in each message.

pub mod dispatch;

pub use dispatch::OutboundDispatcher;

use tokio::sync::{mpsc, Mutex};

use webchat_core::{InboundMessage, OutboundMessage, WebChatError};

/// Two bounded queues: channel -> agent (inbound) and agent -> channel (outbound).
pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    /// Create a bus whose queues each hold up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));
        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
        }
    }

    /// Publish a message from a channel to the agent.
    pub async fn publish_inbound(&self, msg: InboundMessage) -> Result<(), WebChatError> {
        self.inbound_tx
            .send(msg)
            .await
            .map_err(|_| WebChatError::Bus("inbound queue closed".to_string()))
    }

    /// Wait for the next message for the agent. `None` once the bus is closed.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Publish a reply from the agent to a channel.
    pub async fn publish_outbound(&self, msg: OutboundMessage) -> Result<(), WebChatError> {
        self.outbound_tx
            .send(msg)
            .await
            .map_err(|_| WebChatError::Bus("outbound queue closed".to_string()))
    }

    /// Wait for the next reply to deliver. `None` once the bus is closed.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Number of messages waiting for the agent.
    pub fn inbound_len(&self) -> usize {
        self.inbound_tx.max_capacity() - self.inbound_tx.capacity()
    }

    /// Number of replies waiting for delivery.
    pub fn outbound_len(&self) -> usize {
        self.outbound_tx.max_capacity() - self.outbound_tx.capacity()
    }
}
