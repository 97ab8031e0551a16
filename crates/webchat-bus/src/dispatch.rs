// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound routing from the bus to subscribed channels.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use webchat_core::ChannelAdapter;

use crate::MessageBus;

/// Routes each outbound message to the channel named in `msg.channel`.
///
/// Delivery failures are logged and never stop the dispatcher.
#[derive(Default)]
pub struct OutboundDispatcher {
    channels: HashMap<String, Arc<dyn ChannelAdapter>>,
}

impl OutboundDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a channel under its adapter name.
    pub fn subscribe(&mut self, channel: Arc<dyn ChannelAdapter>) {
        let name = channel.name().to_string();
        self.channels.insert(name, channel);
    }

    /// Names of the subscribed channels.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    /// Consume outbound messages until `cancel` fires or the bus closes.
    pub async fn run(&self, bus: &MessageBus, cancel: CancellationToken) {
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = bus.consume_outbound() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let Some(channel) = self.channels.get(&msg.channel) else {
                warn!(channel = %msg.channel, chat_id = %msg.chat_id, "no channel subscribed, dropping outbound message");
                continue;
            };

            let chat_id = msg.chat_id.clone();
            match channel.send(msg).await {
                Ok(id) => debug!(channel = %channel.name(), chat_id = %chat_id, message_id = %id.0, "outbound message handed to channel"),
                Err(e) => warn!(channel = %channel.name(), chat_id = %chat_id, error = %e, "channel failed to send outbound message"),
            }
        }
        debug!("outbound dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use webchat_core::{
        ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
        PluginAdapter, WebChatError,
    };

    struct RecordingChannel {
        name: &'static str,
        sent: Mutex<Vec<OutboundMessage>>,
        fail: bool,
    }

    impl RecordingChannel {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for RecordingChannel {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        async fn health_check(&self) -> Result<HealthStatus, WebChatError> {
            Ok(HealthStatus::Healthy)
        }

        async fn shutdown(&self) -> Result<(), WebChatError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelAdapter for RecordingChannel {
        fn capabilities(&self) -> ChannelCapabilities {
            ChannelCapabilities {
                supports_typing: false,
                supports_reactions: false,
                supports_media: false,
                max_upload_bytes: None,
            }
        }

        async fn connect(&mut self) -> Result<(), WebChatError> {
            Ok(())
        }

        async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WebChatError> {
            if self.fail {
                return Err(WebChatError::Internal("boom".into()));
            }
            self.sent.lock().await.push(msg);
            Ok(MessageId("m".into()))
        }

        async fn receive(&self) -> Result<InboundMessage, WebChatError> {
            std::future::pending().await
        }
    }

    async fn wait_for(channel: &RecordingChannel, count: usize) {
        for _ in 0..100 {
            if channel.sent.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} messages");
    }

    #[tokio::test]
    async fn routes_by_channel_name() {
        let bus = Arc::new(MessageBus::new(8));
        let web = RecordingChannel::new("web", false);
        let other = RecordingChannel::new("other", false);

        let mut dispatcher = OutboundDispatcher::new();
        dispatcher.subscribe(web.clone());
        dispatcher.subscribe(other.clone());
        let mut names = dispatcher.channel_names();
        names.sort();
        assert_eq!(names, vec!["other", "web"]);

        let cancel = CancellationToken::new();
        let task = {
            let bus = Arc::clone(&bus);
            let cancel = cancel.clone();
            tokio::spawn(async move { dispatcher.run(&bus, cancel).await })
        };

        bus.publish_outbound(OutboundMessage::new("web", "s1", "for web"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("nowhere", "s1", "lost"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("other", "s2", "for other"))
            .await
            .unwrap();

        wait_for(&web, 1).await;
        wait_for(&other, 1).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(web.sent.lock().await[0].content, "for web");
        assert_eq!(other.sent.lock().await[0].content, "for other");
    }

    #[tokio::test]
    async fn send_failure_does_not_stop_dispatch() {
        let bus = Arc::new(MessageBus::new(8));
        let broken = RecordingChannel::new("broken", true);
        let web = RecordingChannel::new("web", false);

        let mut dispatcher = OutboundDispatcher::new();
        dispatcher.subscribe(broken);
        dispatcher.subscribe(web.clone());

        let cancel = CancellationToken::new();
        let task = {
            let bus = Arc::clone(&bus);
            let cancel = cancel.clone();
            tokio::spawn(async move { dispatcher.run(&bus, cancel).await })
        };

        bus.publish_outbound(OutboundMessage::new("broken", "s1", "x"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("web", "s1", "still delivered"))
            .await
            .unwrap();

        wait_for(&web, 1).await;
        cancel.cancel();
        task.await.unwrap();
    }
}
