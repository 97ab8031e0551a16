// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session outbound queues and the drain loop that empties them.
//!
//! Queues are created on first use and outlive connections: payloads queued
//! while a client is away are delivered, in order, when it reconnects.
//! Queues are unbounded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::connection::ConnectionHandle;
use crate::frame::DeliveryPayload;

/// FIFO of payloads for one session.
#[derive(Debug, Default)]
pub struct SessionQueue {
    items: Mutex<VecDeque<DeliveryPayload>>,
    notify: Notify,
    /// Held by the active drain loop so only one consumer pops at a time.
    consumer: tokio::sync::Mutex<()>,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<DeliveryPayload>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a payload. Never blocks, never rejects.
    pub fn push(&self, payload: DeliveryPayload) {
        self.items().push_back(payload);
        self.notify.notify_one();
    }

    /// Return a payload that could not be delivered to the head of the queue.
    pub fn push_front(&self, payload: DeliveryPayload) {
        self.items().push_front(payload);
        self.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<DeliveryPayload> {
        self.items().pop_front()
    }

    /// Wait for the next payload. Cancel-safe: nothing is removed unless this resolves.
    pub async fn next(&self) -> DeliveryPayload {
        loop {
            let notified = self.notify.notified();
            if let Some(payload) = self.try_pop() {
                return payload;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Session id -> queue map.
#[derive(Debug, Default)]
pub struct OutboundQueues {
    queues: DashMap<String, Arc<SessionQueue>>,
}

impl OutboundQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue for a session, created if absent.
    pub fn queue(&self, session_id: &str) -> Arc<SessionQueue> {
        self.queues
            .entry(session_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub fn enqueue(&self, session_id: &str, payload: DeliveryPayload) {
        self.queue(session_id).push(payload);
    }

    /// Payloads waiting for a session (0 if it has no queue).
    pub fn pending(&self, session_id: &str) -> usize {
        self.queues
            .get(session_id)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.queues.len()
    }
}

/// Why a drain loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainExit {
    /// The connection was closed or superseded.
    Cancelled,
    /// Writing to the transport failed.
    WriteFailed,
}

/// Deliver queued payloads to `handle` until its drain token is cancelled or
/// a write fails.
///
/// A payload that was popped but not confirmed written goes back to the head
/// of the queue, so the next connection sees it first.
pub async fn drain(session_id: String, queue: Arc<SessionQueue>, handle: ConnectionHandle) -> DrainExit {
    let cancel = handle.drain_token();

    let _consumer = tokio::select! {
        _ = cancel.cancelled() => return DrainExit::Cancelled,
        guard = queue.consumer.lock() => guard,
    };
    debug!(session_id = %session_id, conn_id = %handle.id(), backlog = queue.len(), "drain loop started");

    loop {
        let payload = tokio::select! {
            _ = cancel.cancelled() => return DrainExit::Cancelled,
            payload = queue.next() => payload,
        };

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = handle.send(&payload) => Some(result),
        };

        match written {
            Some(Ok(())) => {
                debug!(session_id = %session_id, kind = payload.kind(), "payload delivered");
            }
            Some(Err(e)) => {
                warn!(session_id = %session_id, conn_id = %handle.id(), error = %e, "write failed, stopping drain loop");
                queue.push_front(payload);
                return DrainExit::WriteFailed;
            }
            None => {
                queue.push_front(payload);
                return DrainExit::Cancelled;
            }
        }
    }
}
