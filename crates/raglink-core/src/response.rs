//! Backend response envelopes.
//!
//! The backend answers either a single-dataset query (one object) or a
//! cross-dataset query (an array of per-dataset answers). Rather than probing
//! the JSON shape at runtime, the union is modeled as [`QueryData`] so every
//! consumer branch is exhaustive.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One retrieved source chunk attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceNode {
    /// Backend-assigned node identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The retrieved text content.
    pub content: String,
    /// Relevance score, if the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Arbitrary metadata attached by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// The structured answer for a single-dataset query.
///
/// Also the shape of the terminal result delivered by a `complete`/`done`
/// event at the end of a streaming exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerData {
    /// The query that was answered.
    #[serde(default)]
    pub query: String,
    /// The generated answer text.
    #[serde(default)]
    pub response: String,
    /// Source chunks the answer was grounded on.
    #[serde(
        default,
        rename = "sourceNodes",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_nodes: Option<Vec<SourceNode>>,
    /// Any additional fields the backend includes.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One per-dataset answer within a cross-dataset query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossAnswer {
    /// The dataset this answer was drawn from.
    pub dataset: String,
    /// The generated answer text for that dataset.
    pub response: String,
}

/// The data portion of a [`QueryResponse`]: one answer or many.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryData {
    /// A cross-dataset query: one answer per queried dataset.
    Cross(Vec<CrossAnswer>),
    /// A single-dataset query answer.
    Single(Box<AnswerData>),
}

/// The backend's full response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Whether the backend handled the request successfully.
    pub success: bool,
    /// The answer payload. Absent when the backend reports a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,
    /// Machine-readable error description, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable detail, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
