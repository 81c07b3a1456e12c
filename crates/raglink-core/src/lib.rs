//! Core types and error definitions shared across the Raglink crates.
//!
//! Raglink fronts a retrieval-augmented-generation (RAG) backend with a
//! streaming relay and a client-side stream consumer. This crate holds the
//! vocabulary both halves speak:
//!
//! # Main types
//!
//! - [`RaglinkError`] — Unified error enum for all Raglink subsystems.
//! - [`RaglinkResult`] — Convenience alias for `Result<T, RaglinkError>`.
//! - [`Role`] / [`Message`] — A chat message, including its live-streaming state.
//! - [`QueryResponse`] / [`QueryData`] — The backend's response envelope, with
//!   the single-dataset and cross-dataset shapes modeled as explicit variants.
//! - [`AnswerData`] — The structured answer payload, also used as the terminal
//!   result of a streaming exchange.

pub mod error;
pub mod message;
pub mod response;

pub use error::{RaglinkError, RaglinkResult};
pub use message::{Message, Role};
pub use response::{AnswerData, CrossAnswer, QueryData, QueryResponse, SourceNode};
