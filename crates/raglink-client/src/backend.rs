//! HTTP client for the relay's API surface.
//!
//! Thin wrapper over `reqwest` covering both the one-shot JSON endpoints and
//! the streaming agent endpoint. The streaming call mirrors the shape of the
//! one-shot calls at the type level: it returns a channel of live updates
//! plus a join handle resolving to the final [`StreamOutcome`].

use crate::consumer::{consume, StreamOutcome, StreamUpdate};
use raglink_core::{QueryResponse, RaglinkError, RaglinkResult};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Client for the Raglink relay (or a directly-reachable backend exposing the
/// same API surface).
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    /// Creates a client for the given base URL (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> RaglinkResult<serde_json::Value> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| RaglinkError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RaglinkError::Backend(format!(
                "GET {path} failed with status {status}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| RaglinkError::Http(e.to_string()))
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> RaglinkResult<serde_json::Value> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RaglinkError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RaglinkError::Backend(format!(
                "POST {path} failed with status {status}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| RaglinkError::Http(e.to_string()))
    }

    async fn post_query(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> RaglinkResult<QueryResponse> {
        let value = self.post_json(path, body).await?;
        let resp: QueryResponse = serde_json::from_value(value)?;
        ensure_success(resp)
    }

    /// Single-dataset RAG query.
    pub async fn query(&self, query: &str, dataset: &str) -> RaglinkResult<QueryResponse> {
        self.post_query("/api/query", &json!({ "query": query, "dataset": dataset }))
            .await
    }

    /// Cross-dataset query: one answer per dataset.
    pub async fn cross_query(
        &self,
        query: &str,
        datasets: &[String],
    ) -> RaglinkResult<QueryResponse> {
        self.post_query("/api/cross", &json!({ "query": query, "datasets": datasets }))
            .await
    }

    /// Agentic (multi-step) query, buffered rather than streamed.
    pub async fn agent(&self, query: &str, dataset: &str) -> RaglinkResult<QueryResponse> {
        self.post_query("/api/agent", &json!({ "query": query, "dataset": dataset }))
            .await
    }

    /// Raw retrieval without generation; returns the backend payload as-is.
    pub async fn retrieve(&self, query: &str, dataset: &str) -> RaglinkResult<serde_json::Value> {
        self.post_json(
            "/api/retrieve",
            &json!({ "query": query, "dataset": dataset }),
        )
        .await
    }

    /// Backend service status.
    pub async fn status(&self) -> RaglinkResult<serde_json::Value> {
        self.get_json("/api/status").await
    }

    /// Backend liveness probe.
    pub async fn health(&self) -> RaglinkResult<serde_json::Value> {
        self.get_json("/api/health").await
    }

    /// The datasets the backend can answer over.
    pub async fn datasets(&self) -> RaglinkResult<serde_json::Value> {
        self.get_json("/api/datasets").await
    }

    /// Backend self-diagnostics.
    pub async fn diagnose(&self) -> RaglinkResult<serde_json::Value> {
        self.get_json("/api/diagnose").await
    }

    /// Opens a streaming agentic query.
    ///
    /// Returns an `mpsc::Receiver<StreamUpdate>` yielding live progress, plus
    /// a join handle resolving to the final [`StreamOutcome`] once the stream
    /// ends. Fails up front if the connection cannot be established or the
    /// relay answers with a non-success status — no partial stream is ever
    /// surfaced in that case.
    pub async fn agent_stream(
        &self,
        query: &str,
        dataset: &str,
    ) -> RaglinkResult<(mpsc::Receiver<StreamUpdate>, JoinHandle<StreamOutcome>)> {
        let resp = self
            .http
            .post(self.url("/api/agent/stream"))
            .json(&json!({ "query": query, "dataset": dataset }))
            .send()
            .await
            .map_err(|e| RaglinkError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RaglinkError::Backend(format!(
                "agent stream failed with status {status}: {body}"
            )));
        }

        let (tx, rx) = mpsc::channel::<StreamUpdate>(256);
        let byte_stream = resp.bytes_stream();
        let handle = tokio::spawn(async move { consume(byte_stream, tx).await });

        Ok((rx, handle))
    }
}

fn ensure_success(resp: QueryResponse) -> RaglinkResult<QueryResponse> {
    if resp.success {
        Ok(resp)
    } else {
        let reason = resp
            .error
            .or(resp.message)
            .unwrap_or_else(|| "backend reported failure".to_string());
        Err(RaglinkError::Backend(reason))
    }
}
