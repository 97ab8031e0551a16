// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers: index page, health, upload, download.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use webchat_core::WebChatError;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the gateway started.
    pub uptime_secs: u64,
    /// Live WebSocket connections.
    pub connections: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// GET /
pub async fn index(State(state): State<GatewayState>) -> Html<String> {
    Html(state.index_html.to_string())
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        connections: state.hub.connection_count(),
    })
}

/// POST /upload
///
/// Takes the first multipart field as the file. The body is always read to
/// the end; once it passes the limit the bytes are discarded and the request
/// is answered with 413, leaving the upload root untouched.
pub async fn upload(State(state): State<GatewayState>, mut multipart: Multipart) -> Response {
    let mut field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No file provided"),
        Err(e) => return error_response(e.status(), e.body_text()),
    };

    let Some(filename) = field.file_name().map(str::to_string) else {
        return error_response(StatusCode::BAD_REQUEST, "No file provided");
    };

    let mut data = Vec::new();
    let mut received = 0usize;
    let mut oversize = false;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                received += chunk.len();
                if !oversize && state.media.check_size(received).is_err() {
                    oversize = true;
                    data = Vec::new();
                }
                if !oversize {
                    data.extend_from_slice(&chunk);
                }
            }
            Ok(None) => break,
            Err(e) => return error_response(e.status(), e.body_text()),
        }
    }

    if oversize {
        warn!(name = %filename, size = received, limit = state.media.max_upload_bytes(), "upload rejected: too large");
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "File too large");
    }

    match state.media.store_upload(&filename, &data).await {
        Ok(stored) => (StatusCode::OK, Json(stored)).into_response(),
        Err(WebChatError::UploadTooLarge { .. }) => {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, "File too large")
        }
        Err(WebChatError::Protocol(_)) => {
            warn!(name = %filename, "upload rejected: invalid filename");
            error_response(StatusCode::BAD_REQUEST, "Invalid filename")
        }
        Err(e) => {
            error!(name = %filename, error = %e, "failed to store upload");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to store upload")
        }
    }
}

/// GET /uploads/{fname}
///
/// Renderable types are served inline, everything else as an attachment.
pub async fn download(State(state): State<GatewayState>, Path(fname): Path<String>) -> Response {
    let file = match state.media.open(&fname).await {
        Ok(file) => file,
        Err(WebChatError::MediaNotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, "Not Found");
        }
        Err(e) => {
            error!(name = %fname, error = %e, "failed to read upload");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to read file");
        }
    };

    let disposition = file.class.disposition;
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_str(&file.class.mime)
                    .unwrap_or(HeaderValue::from_static("application/octet-stream")),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition.header_value(&file.name)).unwrap_or_else(|_| {
                    HeaderValue::from_static(match disposition {
                        crate::media::Disposition::Inline => "inline",
                        crate::media::Disposition::Attachment => "attachment",
                    })
                }),
            ),
        ],
        file.bytes,
    )
        .into_response()
}
