//! Server half of Raglink: the streaming relay and its fetch-and-forward
//! proxy routes.
//!
//! The relay accepts a client request, opens exactly one upstream streaming
//! HTTP request to the RAG backend, and re-emits the upstream SSE byte stream
//! chunk-by-chunk — preserving framing, never buffering to completion. All
//! other routes are simple buffered JSON round trips.

pub mod config;
mod forward;
pub mod server;
pub mod stream;

pub use config::RelayConfig;
pub use server::RelayServer;
pub use stream::StreamRequest;
