// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `webchat serve` command implementation.
//!
//! Wires the web chat channel to the message bus: inbound messages from
//! browsers are pumped onto the bus, and the outbound dispatcher routes bus
//! replies back to the channel. A channel that cannot start is logged and
//! left inactive; the process keeps running until a shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use webchat_bus::{MessageBus, OutboundDispatcher};
use webchat_config::model::WebChatConfig;
use webchat_core::{ChannelAdapter, OutboundMessage, PluginAdapter, WebChatError};
use webchat_gateway::{WebChatChannel, WebChatChannelConfig};

use crate::shutdown;

/// Options passed on the `serve` command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOptions {
    /// Reply to every inbound message with its own content.
    pub echo: bool,
}

/// Runs the `webchat serve` command until SIGINT or SIGTERM.
pub async fn run_serve(config: WebChatConfig, options: ServeOptions) -> Result<(), WebChatError> {
    init_tracing(&config.agent.log_level);
    info!(
        name = config.agent.name.as_str(),
        version = env!("CARGO_PKG_VERSION"),
        echo = options.echo,
        "starting webchat"
    );

    let cancel = shutdown::install_signal_handler();
    run_gateway(config, options, cancel).await
}

/// Build the bus, start the channel, and dispatch until `cancel` fires.
pub(crate) async fn run_gateway(
    config: WebChatConfig,
    options: ServeOptions,
    cancel: CancellationToken,
) -> Result<(), WebChatError> {
    let bus = Arc::new(MessageBus::new(config.bus.capacity));
    let mut dispatcher = OutboundDispatcher::new();
    let mut tasks = Vec::new();
    let mut web_channel: Option<Arc<WebChatChannel>> = None;

    if config.web.enabled {
        let mut channel = WebChatChannel::new(channel_config(&config));
        match channel.connect().await {
            Ok(()) => {
                let channel = Arc::new(channel);
                dispatcher.subscribe(channel.clone());
                tasks.push(tokio::spawn(pump_inbound(
                    channel.clone(),
                    Arc::clone(&bus),
                    cancel.clone(),
                )));
                info!(
                    host = config.web.host.as_str(),
                    port = config.web.port,
                    "web chat channel active"
                );
                web_channel = Some(channel);
            }
            Err(e) => {
                error!(error = %e, "web chat channel unavailable, continuing without it");
            }
        }
    } else {
        debug!("web chat channel disabled by configuration");
    }

    if options.echo {
        tasks.push(tokio::spawn(echo_responder(Arc::clone(&bus), cancel.clone())));
    } else {
        tasks.push(tokio::spawn(log_inbound(Arc::clone(&bus), cancel.clone())));
    }

    info!(channels = ?dispatcher.channel_names(), "outbound dispatcher running");
    dispatcher.run(&bus, cancel.clone()).await;

    if let Some(channel) = web_channel
        && let Err(e) = channel.shutdown().await
    {
        warn!(error = %e, "web chat channel shutdown failed");
    }
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    info!("webchat stopped");
    Ok(())
}

/// Gateway settings derived from the loaded configuration.
fn channel_config(config: &WebChatConfig) -> WebChatChannelConfig {
    WebChatChannelConfig {
        host: config.web.host.clone(),
        port: config.web.port,
        title: config.web.title.clone(),
        allow_from: config.web.allow_from.clone(),
        max_upload_bytes: config.web.max_upload_bytes(),
        upload_dir: PathBuf::from(&config.web.upload_dir),
        inbound_capacity: config.bus.capacity,
    }
}

/// Move messages from a channel onto the bus until cancelled.
async fn pump_inbound(
    channel: Arc<dyn ChannelAdapter>,
    bus: Arc<MessageBus>,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = channel.receive() => received,
        };

        let msg = match received {
            Ok(msg) => msg,
            Err(e) => {
                warn!(channel = channel.name(), error = %e, "channel receive failed, stopping pump");
                break;
            }
        };

        debug!(session_key = %msg.session_key(), media = msg.media.len(), "inbound message");
        if let Err(e) = bus.publish_inbound(msg).await {
            warn!(error = %e, "failed to publish inbound message, stopping pump");
            break;
        }
    }
}

/// Reply to each inbound message with its own content and media.
async fn echo_responder(bus: Arc<MessageBus>, cancel: CancellationToken) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = bus.consume_inbound() => msg,
        };
        let Some(msg) = msg else { break };

        let mut reply = OutboundMessage::new(msg.channel.as_str(), msg.chat_id.as_str(), msg.content);
        reply.media = msg.media;
        if let Err(e) = bus.publish_outbound(reply).await {
            warn!(error = %e, "failed to publish echo reply");
            break;
        }
    }
}

/// Without a responder attached, inbound messages are only logged.
async fn log_inbound(bus: Arc<MessageBus>, cancel: CancellationToken) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = bus.consume_inbound() => msg,
        };
        let Some(msg) = msg else { break };
        info!(
            session_key = %msg.session_key(),
            chars = msg.content.chars().count(),
            media = msg.media.len(),
            "inbound message (no responder attached)"
        );
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("webchat={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
