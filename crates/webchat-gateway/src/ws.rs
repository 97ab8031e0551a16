// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for bidirectional messaging.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "message", "content": "Hello", "media": ["/uploads/photo.png"]}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "reaction", "emoji": "👍"}
//! {"type": "typing"}
//! {"type": "message", "content": "...", "media": [], "is_progress_msg": false, "is_tool_hint_msg": false}
//! {"type": "error", "content": "..."}
//! ```

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::stream::{SplitStream, StreamExt};
use tracing::{debug, error, info};

use webchat_core::WebChatError;

use crate::connection::{ConnectionHandle, WsFrameSink};
use crate::queue::DrainExit;
use crate::server::GatewayState;

/// WebSocket upgrade handler for `/ws/{session_id}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Handle an individual WebSocket connection.
///
/// The write half goes to a drain loop owned by the hub. This task reads
/// client frames until the socket closes, the bus goes away, or the drain
/// loop reports a failed write.
async fn handle_socket(socket: WebSocket, session_id: String, state: GatewayState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let handle = ConnectionHandle::new(Arc::new(WsFrameSink::new(ws_sender)));

    info!(session_id = %session_id, conn_id = %handle.id(), "websocket connected");
    let mut drain = state.hub.connect(&session_id, handle.clone());

    tokio::select! {
        Ok(DrainExit::WriteFailed) = &mut drain => {
            debug!(session_id = %session_id, conn_id = %handle.id(), "closing connection after failed write");
        }
        () = read_frames(&mut ws_receiver, &session_id, &handle, &state) => {}
    }

    let current = state.hub.disconnect(&session_id, &handle);
    info!(
        session_id = %session_id,
        conn_id = %handle.id(),
        superseded = !current,
        "websocket disconnected"
    );
}

async fn read_frames(
    ws_receiver: &mut SplitStream<WebSocket>,
    session_id: &str,
    handle: &ConnectionHandle,
    state: &GatewayState,
) {
    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "websocket read failed");
                return;
            }
        };

        match msg {
            Message::Text(text) => {
                match state.inbound.handle(session_id, handle, text.as_str()).await {
                    Ok(outcome) => debug!(session_id = %session_id, ?outcome, "client frame handled"),
                    Err(e @ WebChatError::Bus(_)) => {
                        error!(session_id = %session_id, error = %e, "failed to forward websocket message");
                        return;
                    }
                    Err(e) => debug!(session_id = %session_id, error = %e, "client frame failed"),
                }
            }
            Message::Close(_) => return,
            // Binary frames carry nothing; ping/pong is answered by the transport.
            _ => {}
        }
    }
}
