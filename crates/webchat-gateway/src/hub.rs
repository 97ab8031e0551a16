// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway-wide session state: who is connected and what is waiting for them.
//!
//! Created when the channel starts and torn down by [`SessionHub::shutdown`].
//! Both maps are sharded, so unrelated sessions never contend on one lock.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::ConnectionHandle;
use crate::frame::DeliveryPayload;
use crate::queue::{self, DrainExit, OutboundQueues};
use crate::registry::SessionRegistry;

#[derive(Debug, Default)]
pub struct SessionHub {
    registry: Arc<SessionRegistry>,
    queues: OutboundQueues,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn queues(&self) -> &OutboundQueues {
        &self.queues
    }

    /// Register a new connection and start draining the session's queue into it.
    ///
    /// A connection already registered for the session is superseded: its
    /// drain loop is cancelled, and the new loop starts once the old one has
    /// released the queue. A drain loop that stops on a failed write drops
    /// its own registry entry, so later payloads wait for the next connect.
    pub fn connect(&self, session_id: &str, handle: ConnectionHandle) -> JoinHandle<DrainExit> {
        if let Some(previous) = self.registry.register(session_id, handle.clone()) {
            info!(
                session_id = %session_id,
                old_conn = %previous.id(),
                new_conn = %handle.id(),
                "connection superseded by reconnect"
            );
            previous.cancel_drain();
        }

        let queue = self.queues.queue(session_id);
        let registry = Arc::clone(&self.registry);
        let session = session_id.to_string();
        tokio::spawn(async move {
            let exit = queue::drain(session.clone(), queue, handle.clone()).await;
            debug!(session_id = %session, conn_id = %handle.id(), ?exit, "drain loop exited");
            if exit == DrainExit::WriteFailed && registry.unregister(&session, &handle) {
                warn!(session_id = %session, conn_id = %handle.id(), "connection dropped after failed write");
            }
            exit
        })
    }

    /// Tear down a connection: stop its drain loop and drop its registry
    /// entry if it is still the current one. Queued payloads stay.
    pub fn disconnect(&self, session_id: &str, handle: &ConnectionHandle) -> bool {
        handle.cancel_drain();
        self.registry.unregister(session_id, handle)
    }

    /// Queue a payload for a session, connected or not.
    pub fn enqueue(&self, session_id: &str, payload: DeliveryPayload) {
        debug!(session_id = %session_id, kind = payload.kind(), "payload queued");
        self.queues.enqueue(session_id, payload);
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_connected(&self, session_id: &str) -> bool {
        self.registry.lookup(session_id).is_some()
    }

    /// Stop every drain loop and forget every connection. Queues are kept.
    pub fn shutdown(&self) {
        let handles = self.registry.take_all();
        for handle in &handles {
            handle.cancel_drain();
        }
        info!(connections = handles.len(), "session hub shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::recording_handle;

    #[tokio::test]
    async fn offline_backlog_is_delivered_on_connect() {
        let hub = SessionHub::new();
        hub.enqueue("s1", DeliveryPayload::Typing);
        hub.enqueue("s1", DeliveryPayload::text("hi"));
        assert!(!hub.is_connected("s1"));

        let (handle, sink) = recording_handle();
        let drain = hub.connect("s1", handle.clone());
        sink.wait_for(2).await;

        assert_eq!(sink.kinds(), vec!["typing", "message"]);
        assert!(sink.frames()[1].contains("\"hi\""));
        assert!(hub.is_connected("s1"));

        assert!(hub.disconnect("s1", &handle));
        assert_eq!(drain.await.unwrap(), DrainExit::Cancelled);
        assert!(!hub.is_connected("s1"));
    }

    #[tokio::test]
    async fn payloads_survive_disconnect() {
        let hub = SessionHub::new();
        let (first, first_sink) = recording_handle();
        let drain = hub.connect("s1", first.clone());
        hub.enqueue("s1", DeliveryPayload::text("one"));
        first_sink.wait_for(1).await;

        hub.disconnect("s1", &first);
        drain.await.unwrap();

        hub.enqueue("s1", DeliveryPayload::text("two"));
        hub.enqueue("s1", DeliveryPayload::text("three"));
        assert_eq!(hub.queues().pending("s1"), 2);

        let (second, second_sink) = recording_handle();
        let drain = hub.connect("s1", second.clone());
        second_sink.wait_for(2).await;
        assert!(second_sink.frames()[0].contains("two"));
        assert!(second_sink.frames()[1].contains("three"));

        hub.disconnect("s1", &second);
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn reconnect_supersedes_old_connection() {
        let hub = SessionHub::new();
        let (old, old_sink) = recording_handle();
        let (new, new_sink) = recording_handle();

        let old_drain = hub.connect("s1", old.clone());
        let new_drain = hub.connect("s1", new.clone());
        assert_eq!(old_drain.await.unwrap(), DrainExit::Cancelled);

        hub.enqueue("s1", DeliveryPayload::text("after reconnect"));
        new_sink.wait_for(1).await;
        assert!(old_sink.frames().is_empty());

        // The stale disconnect must not evict the newer connection.
        assert!(!hub.disconnect("s1", &old));
        assert!(hub.registry().lookup("s1").unwrap().same_as(&new));

        hub.disconnect("s1", &new);
        new_drain.await.unwrap();
    }

    #[tokio::test]
    async fn failed_write_unregisters_connection_and_keeps_payload() {
        let hub = SessionHub::new();
        let (handle, sink) = recording_handle();
        sink.set_failing(true);

        let drain = hub.connect("s1", handle.clone());
        hub.enqueue("s1", DeliveryPayload::text("undeliverable"));
        assert_eq!(drain.await.unwrap(), DrainExit::WriteFailed);

        assert!(!hub.is_connected("s1"));
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.queues().pending("s1"), 1);

        // The next connection picks up what the broken one could not send.
        let (next, next_sink) = recording_handle();
        let drain = hub.connect("s1", next.clone());
        next_sink.wait_for(1).await;
        assert!(next_sink.frames()[0].contains("undeliverable"));

        hub.disconnect("s1", &next);
        drain.await.unwrap();
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let hub = SessionHub::new();
        let (a, a_sink) = recording_handle();
        let (b, b_sink) = recording_handle();
        let a_drain = hub.connect("a", a.clone());
        let b_drain = hub.connect("b", b.clone());

        hub.enqueue("a", DeliveryPayload::text("for a"));
        hub.enqueue("b", DeliveryPayload::text("for b"));
        a_sink.wait_for(1).await;
        b_sink.wait_for(1).await;
        assert!(a_sink.frames()[0].contains("for a"));
        assert!(b_sink.frames()[0].contains("for b"));
        assert_eq!(hub.connection_count(), 2);

        hub.shutdown();
        assert_eq!(hub.connection_count(), 0);
        a_drain.await.unwrap();
        b_drain.await.unwrap();
    }
}
