//! Unified error type for the Raglink crates.

use thiserror::Error;

/// A convenience `Result` alias using [`RaglinkError`].
pub type RaglinkResult<T> = Result<T, RaglinkError>;

/// Top-level error type for Raglink.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum RaglinkError {
    /// An error from the relay layer (upstream connection, response building).
    #[error("Relay error: {0}")]
    Relay(String),

    /// A failure reported by or while reaching the RAG backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// An error while reading or framing an event stream.
    #[error("Stream error: {0}")]
    Stream(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),
}
