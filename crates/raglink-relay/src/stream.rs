//! The streaming relay: forwards the backend's SSE response chunk-by-chunk.
//!
//! The relay never buffers the upstream body to completion — each chunk is
//! re-emitted as soon as it is read, so end-to-end latency stays at one chunk.
//! If the upstream connection cannot be established or answers non-2xx, the
//! relay fails closed with a single JSON error response; no partial stream is
//! ever forwarded. A read error after bytes have started flowing aborts the
//! downstream body, which is the only broken-close signal the transport can
//! carry.

use crate::server::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Inbound body for the streaming endpoint. The fields are mirrored upstream
/// verbatim; shape validation beyond this is the backend's concern.
#[derive(Debug, Serialize, Deserialize)]
pub struct StreamRequest {
    /// The user's query.
    pub query: String,
    /// The dataset to answer over.
    pub dataset: String,
}

/// `POST /api/agent/stream` — open one upstream streaming request and relay
/// its body byte-for-byte.
pub async fn relay_agent_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StreamRequest>,
) -> Response {
    let url = state.config.backend_url("/agent/stream");
    info!(dataset = %req.dataset, "Opening upstream agent stream");

    let upstream = match state.http.post(&url).json(&req).send().await {
        Ok(resp) => resp,
        Err(err) => {
            error!(error = %err, "Failed to reach agent stream upstream");
            return error_response("Failed to fetch data from agent service");
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        error!(%status, "Agent stream upstream answered non-success");
        return error_response(&format!("Agent service error, status {status}"));
    }

    // Forward chunks as they arrive. An upstream read error surfaces through
    // the body stream and aborts the connection instead of closing it cleanly.
    let stream = upstream
        .bytes_stream()
        .inspect_err(|err| error!(error = %err, "Upstream stream read error"));

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "POST")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .body(Body::from_stream(stream))
    {
        Ok(resp) => resp,
        Err(err) => {
            error!(error = %err, "Failed to build relay response");
            error_response("Failed to build stream response")
        }
    }
}

/// A single non-streaming error answer, used whenever the relay fails closed.
fn error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
