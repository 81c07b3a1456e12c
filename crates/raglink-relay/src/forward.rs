//! One-shot fetch-and-forward routes.
//!
//! Each handler is a single buffered JSON round trip to the backend: no
//! incremental framing, no response rewriting. Failures become a 500 with the
//! standard `{success, error, message}` envelope.

use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct QueryBody {
    query: String,
    dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CrossBody {
    query: String,
    datasets: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct AgentBody {
    query: String,
    dataset: String,
}

/// `POST /api/query` → backend `/query`.
pub(crate) async fn query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryBody>,
) -> Response {
    forward_post(&state, "/query", &body).await
}

/// `POST /api/cross` → backend `/cross-query`.
pub(crate) async fn cross(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CrossBody>,
) -> Response {
    forward_post(&state, "/cross-query", &body).await
}

/// `POST /api/agent` → backend `/agent` (buffered, non-streaming).
pub(crate) async fn agent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AgentBody>,
) -> Response {
    forward_post(&state, "/agent", &body).await
}

/// `POST /api/retrieve` → backend `/retrieve`.
pub(crate) async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AgentBody>,
) -> Response {
    forward_post(&state, "/retrieve", &body).await
}

/// `GET /api/status` → backend `/status`.
pub(crate) async fn status(State(state): State<Arc<AppState>>) -> Response {
    forward_get(&state, "/status").await
}

/// `GET /api/health` → backend `/health`.
pub(crate) async fn backend_health(State(state): State<Arc<AppState>>) -> Response {
    forward_get(&state, "/health").await
}

/// `GET /api/datasets` → backend `/datasets`.
pub(crate) async fn datasets(State(state): State<Arc<AppState>>) -> Response {
    forward_get(&state, "/datasets").await
}

/// `GET /api/diagnose` → backend `/diagnose`.
pub(crate) async fn diagnose(State(state): State<Arc<AppState>>) -> Response {
    forward_get(&state, "/diagnose").await
}

async fn forward_post<B: Serialize>(state: &AppState, path: &str, body: &B) -> Response {
    let url = state.config.backend_url(path);
    let result = state.http.post(&url).json(body).send().await;
    build_forwarded(path, result).await
}

async fn forward_get(state: &AppState, path: &str) -> Response {
    let url = state.config.backend_url(path);
    let result = state.http.get(&url).send().await;
    build_forwarded(path, result).await
}

async fn build_forwarded(
    path: &str,
    result: Result<reqwest::Response, reqwest::Error>,
) -> Response {
    let resp = match result {
        Ok(resp) => resp,
        Err(err) => {
            error!(path, error = %err, "Backend unreachable");
            return failure_response(path, &err.to_string());
        }
    };

    let status = resp.status();
    if !status.is_success() {
        error!(path, %status, "Backend answered non-success");
        return failure_response(path, &format!("backend status {status}"));
    }

    match resp.json::<serde_json::Value>().await {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            error!(path, error = %err, "Backend answered non-JSON body");
            failure_response(path, &err.to_string())
        }
    }
}

fn failure_response(path: &str, detail: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": format!("Failed to fetch data from {path} service"),
            "message": detail,
        })),
    )
        .into_response()
}
