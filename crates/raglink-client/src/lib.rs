//! Client half of Raglink: SSE framing, stream consumption, and the HTTP
//! client for the relay's API surface.
//!
//! The centerpiece is the stream consumer pipeline:
//! [`SseFrameBuffer`](sse::SseFrameBuffer) reassembles events under arbitrary
//! chunk boundaries, [`StreamAssembler`](consumer::StreamAssembler) folds
//! them into a live [`Message`](raglink_core::Message) plus a terminal
//! result, and [`BackendClient::agent_stream`](backend::BackendClient::agent_stream)
//! wires the two to a real HTTP response body.

pub mod backend;
pub mod consumer;
pub mod session;
pub mod sse;

pub use backend::BackendClient;
pub use consumer::{consume, StreamAssembler, StreamOutcome, StreamUpdate};
pub use session::{ChatSession, QueryMode, QueryRoute};
pub use sse::{SseEvent, SseFrameBuffer};
