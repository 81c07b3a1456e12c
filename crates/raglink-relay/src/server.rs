//! Router assembly and shared state for the relay.

use crate::config::RelayConfig;
use crate::{forward, stream};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

/// Shared application state: one HTTP client, one backend config.
///
/// Requests share nothing else — every relay request owns its own upstream
/// connection and buffer, released when its response body is dropped.
pub struct AppState {
    /// Where to forward requests.
    pub config: RelayConfig,
    /// Outbound HTTP client (connection pooling lives here).
    pub http: reqwest::Client,
}

/// The relay server.
pub struct RelayServer;

impl RelayServer {
    /// Builds the relay router for the given backend config.
    pub fn build(config: RelayConfig) -> Router {
        let state = Arc::new(AppState {
            config,
            http: reqwest::Client::new(),
        });

        Router::new()
            .route("/health", get(health_handler))
            .route("/api/agent/stream", post(stream::relay_agent_stream))
            .route("/api/query", post(forward::query))
            .route("/api/cross", post(forward::cross))
            .route("/api/agent", post(forward::agent))
            .route("/api/retrieve", post(forward::retrieve))
            .route("/api/status", get(forward::status))
            .route("/api/health", get(forward::backend_health))
            .route("/api/datasets", get(forward::datasets))
            .route("/api/diagnose", get(forward::diagnose))
            .with_state(state)
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "raglink"}))
}
