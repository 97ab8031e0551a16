// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Browser chat gateway implementing ChannelAdapter.
//!
//! Browsers connect over `/ws/{session_id}`, upload files through `/upload`,
//! and fetch them back from `/uploads/{name}`. Messages from the bus are
//! queued per session and drained into whichever connection currently owns
//! the session, so replies sent while a browser is offline arrive on its next
//! connection in order.

pub mod connection;
pub mod frame;
pub mod handlers;
pub mod hub;
pub mod inbound;
pub mod media;
pub mod queue;
pub mod registry;
pub mod server;
pub mod ws;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use webchat_core::{
    ChannelAdapter, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
    PluginAdapter, WebChatError,
};

use crate::frame::DeliveryPayload;
use crate::hub::SessionHub;
use crate::inbound::InboundHandler;
use crate::media::MediaBridge;
use crate::server::{GatewayState, HealthState, ServerConfig};

/// Channel name used on the bus.
pub const CHANNEL_NAME: &str = "web";

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

/// Web chat channel configuration.
///
/// Mirrors `WebConfig` from `webchat-config` to avoid a dependency on
/// the config crate from the gateway crate.
#[derive(Debug, Clone)]
pub struct WebChatChannelConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,
    /// Page title for the embedded UI.
    pub title: String,
    /// Session ids allowed to talk to the bus. Empty allows everyone.
    pub allow_from: Vec<String>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
    /// Directory uploads are stored in and served from.
    pub upload_dir: PathBuf,
    /// Capacity of the inbound queue between the sockets and `receive()`.
    pub inbound_capacity: usize,
}

/// HTTP/WebSocket chat channel.
///
/// The axum server runs as a background task started by `connect()`.
/// Socket tasks push normalized messages into an mpsc channel that
/// `receive()` reads from; `send()` queues payloads in the [`SessionHub`].
pub struct WebChatChannel {
    config: WebChatChannelConfig,
    hub: Arc<SessionHub>,
    media: Arc<MediaBridge>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    server_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    local_addr: Option<SocketAddr>,
}

impl WebChatChannel {
    pub fn new(config: WebChatChannelConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let media = Arc::new(MediaBridge::new(
            config.upload_dir.clone(),
            config.max_upload_bytes,
        ));
        Self {
            config,
            hub: Arc::new(SessionHub::new()),
            media,
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            server_handle: Mutex::new(None),
            local_addr: None,
        }
    }

    /// Address the server is bound to, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn hub(&self) -> &Arc<SessionHub> {
        &self.hub
    }

    pub fn media(&self) -> &Arc<MediaBridge> {
        &self.media
    }

    /// Queue an error frame for a session.
    pub fn send_error(&self, chat_id: &str, content: impl Into<String>) {
        self.hub.enqueue(
            chat_id,
            DeliveryPayload::Error {
                content: content.into(),
            },
        );
    }

    fn state(&self) -> GatewayState {
        GatewayState {
            hub: Arc::clone(&self.hub),
            media: Arc::clone(&self.media),
            inbound: InboundHandler::new(
                CHANNEL_NAME,
                Arc::clone(&self.media),
                self.config.allow_from.iter().cloned(),
                self.inbound_tx.clone(),
            ),
            index_html: Arc::from(render_index(&self.config.title)),
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        }
    }
}

/// Substitute the escaped title into the embedded page.
fn render_index(title: &str) -> String {
    let escaped = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;");
    INDEX_TEMPLATE.replace("{{TITLE}}", &escaped)
}

#[async_trait]
impl PluginAdapter for WebChatChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, WebChatError> {
        let handle = self.server_handle.lock().await;
        match handle.as_ref() {
            Some(h) if !h.is_finished() => Ok(HealthStatus::Healthy),
            Some(_) => Ok(HealthStatus::Unhealthy("server stopped".to_string())),
            None => Ok(HealthStatus::Unhealthy("server not started".to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), WebChatError> {
        self.hub.shutdown();
        let mut handle = self.server_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("web chat channel shut down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WebChatChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_reactions: true,
            supports_media: true,
            max_upload_bytes: Some(self.config.max_upload_bytes),
        }
    }

    async fn connect(&mut self) -> Result<(), WebChatError> {
        if let Err(e) = self.media.ensure_root().await {
            error!(
                upload_dir = %self.config.upload_dir.display(),
                error = %e,
                "failed to create upload directory"
            );
            return Err(WebChatError::Unavailable(format!(
                "upload directory {} is not usable: {e}",
                self.config.upload_dir.display()
            )));
        }

        let server_config = ServerConfig {
            host: self.config.host.clone(),
            port: self.config.port,
        };
        let listener = match server::bind(&server_config).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %server_config.addr(), error = %e, "web chat failed to start");
                return Err(e);
            }
        };
        self.local_addr = listener.local_addr().ok();

        let state = self.state();
        let handle = tokio::spawn(async move {
            if let Err(e) = server::serve(listener, state).await {
                error!("web chat server error: {e}");
            }
        });

        let mut server_handle = self.server_handle.lock().await;
        *server_handle = Some(handle);

        info!(
            addr = ?self.local_addr,
            upload_dir = %self.config.upload_dir.display(),
            "web chat channel connected"
        );
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WebChatError> {
        let media = self.media.resolve_outbound(&msg.media).await;
        let payload = DeliveryPayload::Message {
            is_progress_msg: msg.is_progress(),
            is_tool_hint_msg: msg.is_tool_hint(),
            content: msg.content,
            media,
        };
        self.hub.enqueue(&msg.chat_id, payload);
        Ok(MessageId(Uuid::new_v4().to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, WebChatError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| WebChatError::Bus("web chat inbound channel closed".to_string()))
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), WebChatError> {
        self.hub.enqueue(chat_id, DeliveryPayload::Typing);
        Ok(())
    }
}
