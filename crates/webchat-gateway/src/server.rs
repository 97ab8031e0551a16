// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use webchat_core::WebChatError;

use crate::handlers;
use crate::hub::SessionHub;
use crate::inbound::InboundHandler;
use crate::media::MediaBridge;
use crate::ws;

/// Health state for the public health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Connections and outbound queues.
    pub hub: Arc<SessionHub>,
    /// Upload root and size limit.
    pub media: Arc<MediaBridge>,
    /// Client frame handling and bus handoff.
    pub inbound: InboundHandler,
    /// Rendered index page.
    pub index_html: Arc<str>,
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the router:
/// - GET / (embedded UI)
/// - GET /health
/// - POST /upload
/// - GET /uploads/{fname}
/// - GET /ws/{session_id}
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::get_health))
        // The upload handler enforces its own limit while streaming.
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/uploads/{fname}", get(handlers::download))
        .route("/ws/{session_id}", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listener for `config`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, WebChatError> {
    let addr = config.addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|e| WebChatError::Unavailable(format!("failed to bind web chat to {addr}: {e}")))
}

/// Serve the gateway on an already-bound listener until the task is aborted.
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<(), WebChatError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("web chat listening on http://{addr}");
    }

    axum::serve(listener, router(state))
        .await
        .map_err(|e| WebChatError::Transport {
            message: format!("web chat server error: {e}"),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    #[test]
    fn gateway_state_is_clone() {
        let (tx, _rx) = mpsc::channel(1);
        let media = Arc::new(MediaBridge::new("/tmp/media", 1024));
        let state = GatewayState {
            hub: Arc::new(SessionHub::new()),
            media: Arc::clone(&media),
            inbound: InboundHandler::new("web", media, Vec::new(), tx),
            index_html: Arc::from("<html></html>"),
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        };
        let _cloned = state.clone();
        let _router = router(state);
    }

    #[test]
    fn server_config_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8088,
        };
        assert_eq!(config.addr(), "127.0.0.1:8088");
        assert!(format!("{config:?}").contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn bind_failure_is_unavailable() {
        let config = ServerConfig {
            host: "256.0.0.1".to_string(),
            port: 1,
        };
        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, WebChatError::Unavailable(_)));
    }
}
