//! Conversation state for one page/terminal session.
//!
//! [`ChatSession`] owns the message list, the last raw backend response, the
//! terminal result, and the diagnostic event log — nothing else mutates them.
//! Busy-state gating is published through a `tokio::sync::watch` channel so
//! observers are notified on change instead of polling a shared flag.

use crate::backend::BackendClient;
use crate::consumer::{StreamOutcome, StreamUpdate};
use crate::sse::SseEvent;
use raglink_core::{Message, QueryData, QueryResponse, RaglinkResult};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// The pseudo-dataset that selects a cross-dataset query.
pub const CROSS_QUERY_DATASET: &str = "cross_query";

/// Datasets a cross query fans out to when none are configured.
pub const DEFAULT_CROSS_DATASETS: [&str; 2] = ["price_index_statistics", "machine_learning"];

/// How a query should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    /// Single retrieve-then-generate pass.
    #[serde(rename = "basic_rag")]
    Basic,
    /// Multi-step agentic answering.
    #[serde(rename = "agentic_rag")]
    Agentic,
}

impl std::str::FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" | "basic_rag" => Ok(Self::Basic),
            "agentic" | "agentic_rag" => Ok(Self::Agentic),
            other => Err(format!("unknown query mode '{other}'")),
        }
    }
}

/// The endpoint and body shape a (mode, dataset) pair resolves to.
///
/// An explicit variant per request shape, so dispatch is exhaustive instead
/// of stringly-typed endpoint selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRoute {
    /// `POST /api/query` with a single dataset.
    Query {
        /// The dataset to answer over.
        dataset: String,
    },
    /// `POST /api/agent` with a single dataset.
    Agent {
        /// The dataset to answer over.
        dataset: String,
    },
    /// `POST /api/cross` fanning out to several datasets.
    Cross {
        /// The datasets to answer over.
        datasets: Vec<String>,
    },
}

impl QueryRoute {
    /// Resolves the route for a mode and dataset selection.
    ///
    /// The `cross_query` pseudo-dataset takes priority over the mode and fans
    /// out to the default dataset pair.
    pub fn resolve(mode: QueryMode, dataset: &str) -> Self {
        if dataset == CROSS_QUERY_DATASET {
            return Self::Cross {
                datasets: DEFAULT_CROSS_DATASETS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            };
        }
        match mode {
            QueryMode::Basic => Self::Query {
                dataset: dataset.to_string(),
            },
            QueryMode::Agentic => Self::Agent {
                dataset: dataset.to_string(),
            },
        }
    }
}

/// Owns the conversation and all state derived from backend responses.
pub struct ChatSession {
    client: BackendClient,
    messages: Vec<Message>,
    raw_response: Option<QueryResponse>,
    terminal: Option<raglink_core::AnswerData>,
    event_log: Vec<SseEvent>,
    service_status: Option<serde_json::Value>,
    busy: watch::Sender<bool>,
}

impl ChatSession {
    /// Creates a session backed by the given client.
    pub fn new(client: BackendClient) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            client,
            messages: Vec::new(),
            raw_response: None,
            terminal: None,
            event_log: Vec::new(),
            service_status: None,
            busy,
        }
    }

    /// Subscribes to busy-state changes. The flag flips to `true` while a
    /// request is in flight and back to `false` when it settles.
    pub fn busy_watch(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// The conversation so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The raw envelope of the last non-streaming response.
    pub fn raw_response(&self) -> Option<&QueryResponse> {
        self.raw_response.as_ref()
    }

    /// The terminal result of the last streaming exchange.
    pub fn terminal(&self) -> Option<&raglink_core::AnswerData> {
        self.terminal.as_ref()
    }

    /// Every SSE event from the last streaming exchange, in arrival order.
    pub fn event_log(&self) -> &[SseEvent] {
        &self.event_log
    }

    /// The last known backend service status.
    pub fn service_status(&self) -> Option<&serde_json::Value> {
        self.service_status.as_ref()
    }

    /// Fetches the backend service status, storing either the reported status
    /// or an error record with a timestamp.
    pub async fn refresh_status(&mut self) -> &serde_json::Value {
        let status = match self.client.status().await {
            Ok(data) => data,
            Err(err) => serde_json::json!({
                "error": format!("Failed to fetch status: {err}"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        };
        self.service_status.insert(status)
    }

    /// Sends a non-streaming query, appending the user message and either the
    /// assistant answer or a synthesized assistant error message.
    pub async fn send(&mut self, query: &str, mode: QueryMode, dataset: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.busy.send_replace(true);
        self.messages.push(Message::user(query));

        let route = QueryRoute::resolve(mode, dataset);
        let result = match &route {
            QueryRoute::Query { dataset } => self.client.query(query, dataset).await,
            QueryRoute::Agent { dataset } => self.client.agent(query, dataset).await,
            QueryRoute::Cross { datasets } => self.client.cross_query(query, datasets).await,
        };

        match result {
            Ok(resp) => {
                let content = render_answer(&resp);
                self.raw_response = Some(resp);
                self.messages.push(Message::assistant(content));
            }
            Err(err) => {
                self.raw_response = None;
                self.messages.push(Message::assistant(format!(
                    "Sorry, something went wrong handling your request: {err}"
                )));
            }
        }

        self.busy.send_replace(false);
    }

    /// Sends a streaming agentic query, invoking `on_update` for each live
    /// update as it arrives.
    ///
    /// The assembled assistant message always joins the conversation — even
    /// after a mid-stream failure, content accumulated so far is kept, and a
    /// synthesized assistant error message is appended after it.
    pub async fn send_streaming(
        &mut self,
        query: &str,
        dataset: &str,
        mut on_update: impl FnMut(&StreamUpdate),
    ) -> RaglinkResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        self.busy.send_replace(true);
        self.messages.push(Message::user(query));

        let opened = self.client.agent_stream(query, dataset).await;
        let (mut rx, handle) = match opened {
            Ok(pair) => pair,
            Err(err) => {
                self.messages.push(Message::assistant(format!(
                    "Sorry, the answer service could not be reached: {err}"
                )));
                self.busy.send_replace(false);
                return Err(err);
            }
        };

        while let Some(update) = rx.recv().await {
            on_update(&update);
        }

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Join failure means the consumer task itself died; surface
                // it like any other stream failure.
                self.messages.push(Message::assistant(format!(
                    "Sorry, something went wrong while reading the answer: {err}"
                )));
                self.busy.send_replace(false);
                return Err(raglink_core::RaglinkError::Stream(err.to_string()));
            }
        };

        self.absorb_outcome(outcome);
        self.busy.send_replace(false);
        Ok(())
    }

    fn absorb_outcome(&mut self, outcome: StreamOutcome) {
        info!(
            events = outcome.events.len(),
            complete = outcome.is_complete(),
            "Streaming exchange finished"
        );

        let failure = outcome.failure.clone();
        if outcome.terminal.is_some() {
            self.terminal = outcome.terminal;
        }
        self.event_log = outcome.events;
        self.messages.push(outcome.message);

        if let Some(reason) = failure {
            self.messages.push(Message::assistant(format!(
                "Sorry, the response stream was interrupted: {reason}"
            )));
        }
    }
}

/// Renders a response envelope into displayable assistant text.
///
/// Cross-dataset answers become one labeled section per dataset.
fn render_answer(resp: &QueryResponse) -> String {
    match &resp.data {
        Some(QueryData::Single(answer)) => {
            if answer.response.is_empty() {
                "Sorry, no answer text was returned.".to_string()
            } else {
                answer.response.clone()
            }
        }
        Some(QueryData::Cross(answers)) => answers
            .iter()
            .map(|a| format!("[{}]\n{}", a.dataset, a.response))
            .collect::<Vec<_>>()
            .join("\n\n"),
        None => "Sorry, no answer text was returned.".to_string(),
    }
}
