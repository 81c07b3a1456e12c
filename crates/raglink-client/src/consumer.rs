//! Folding parsed SSE events into a live chat message and a terminal result.
//!
//! The consumer side of the relay: a byte stream goes in, a finished
//! [`Message`], an optional terminal [`AnswerData`], and an ordered
//! diagnostic event log come out. Incremental progress is published over an
//! `mpsc` channel as [`StreamUpdate`]s while the stream is in flight.

use crate::sse::{SseEvent, SseFrameBuffer};
use futures_util::{Stream, StreamExt};
use raglink_core::{AnswerData, Message};
use tokio::sync::mpsc;
use tracing::warn;

/// An incremental update published while a streaming response is in flight.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    /// A chunk of assistant message text.
    Delta {
        /// The appended text.
        text: String,
    },
    /// The terminal structured result arrived.
    Completed {
        /// The parsed terminal payload.
        result: AnswerData,
    },
    /// An event with an unrecognized name; logged but not folded.
    Event {
        /// The event name.
        name: String,
        /// The raw data payload.
        data: String,
    },
    /// The stream failed mid-read.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// The final state of a streaming exchange.
#[derive(Debug)]
pub struct StreamOutcome {
    /// The assembled assistant message, streaming flag cleared.
    pub message: Message,
    /// The terminal structured result, if a `complete`/`done` event arrived.
    pub terminal: Option<AnswerData>,
    /// Every parsed event, in arrival order, for raw-stream inspection.
    pub events: Vec<SseEvent>,
    /// The read failure that ended the stream, if any.
    pub failure: Option<String>,
}

impl StreamOutcome {
    /// Whether the exchange completed fully.
    ///
    /// A missing terminal event is treated as the authoritative signal of an
    /// incomplete exchange — the transport alone cannot distinguish a clean
    /// close from a dropped connection.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.terminal.is_some()
    }
}

/// Folds [`SseEvent`]s into a streaming [`Message`] and terminal result.
#[derive(Debug)]
pub struct StreamAssembler {
    message: Message,
    terminal: Option<AnswerData>,
    events: Vec<SseEvent>,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    /// Creates an assembler with a fresh streaming assistant message.
    pub fn new() -> Self {
        Self {
            message: Message::streaming(),
            terminal: None,
            events: Vec::new(),
        }
    }

    /// The message being built.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The terminal result captured so far.
    pub fn terminal(&self) -> Option<&AnswerData> {
        self.terminal.as_ref()
    }

    /// Applies one event, returning the update it produced, if any.
    ///
    /// Content events append to the message via the recovery chain in
    /// [`extract_delta`]. Terminal events overwrite the terminal slot (last
    /// wins); a terminal payload that fails to parse is logged and swallowed
    /// so a broken trailer never interrupts an otherwise-good stream. Events
    /// with any other name only land in the diagnostic log.
    pub fn apply(&mut self, event: SseEvent) -> Option<StreamUpdate> {
        let update = if event.is_content() {
            extract_delta(&event.data).map(|text| {
                self.message.push_content(&text);
                StreamUpdate::Delta { text }
            })
        } else if event.is_terminal() {
            match serde_json::from_str::<AnswerData>(&event.data) {
                Ok(result) => {
                    self.terminal = Some(result.clone());
                    Some(StreamUpdate::Completed { result })
                }
                Err(err) => {
                    warn!(error = %err, "Discarding unparseable terminal payload");
                    None
                }
            }
        } else {
            Some(StreamUpdate::Event {
                name: event.name.clone().unwrap_or_default(),
                data: event.data.clone(),
            })
        };

        self.events.push(event);
        update
    }

    /// Finalizes the exchange, clearing the message's streaming flag.
    pub fn finish(mut self, failure: Option<String>) -> StreamOutcome {
        self.message.finish();
        StreamOutcome {
            message: self.message,
            terminal: self.terminal,
            events: self.events,
            failure,
        }
    }
}

/// Interprets a content event's data payload as incremental message text.
///
/// Recovery chain, in order: a JSON object with a string `content` field
/// yields that field; a JSON string yields itself; anything that fails to
/// parse as JSON is taken verbatim as plain text. JSON that parses to some
/// other shape contributes nothing.
fn extract_delta(data: &str) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(serde_json::Value::Object(map)) => map
            .get("content")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string),
        Ok(serde_json::Value::String(text)) => Some(text),
        Ok(_) => None,
        Err(_) => Some(data.to_string()),
    }
}

/// Drives a byte stream to completion, folding events as they arrive.
///
/// Updates are sent over `tx` as they happen; the returned outcome carries
/// the assembled message (streaming flag cleared on every exit path), the
/// terminal result, and the event log. A mid-stream read error is reported
/// both as a [`StreamUpdate::Error`] and in the outcome's `failure` field —
/// content accumulated before the failure is never lost.
pub async fn consume<S, B, E>(mut stream: S, tx: mpsc::Sender<StreamUpdate>) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut frames = SseFrameBuffer::new();
    let mut assembler = StreamAssembler::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                frames.push(bytes.as_ref());
                for event in frames.drain() {
                    if let Some(update) = assembler.apply(event) {
                        // A dropped receiver is not an error; keep folding so
                        // the outcome is still complete.
                        let _ = tx.send(update).await;
                    }
                }
            }
            Err(err) => {
                let message = format!("Stream read error: {err}");
                warn!("{message}");
                let _ = tx
                    .send(StreamUpdate::Error {
                        message: message.clone(),
                    })
                    .await;
                return assembler.finish(Some(message));
            }
        }
    }

    assembler.finish(None)
}
