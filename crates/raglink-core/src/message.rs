//! Chat message types, including live-streaming state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human end-user.
    User,
    /// The assistant answering from the RAG backend.
    Assistant,
}

/// A single message in the conversation.
///
/// While a streaming response is in flight, `content` is an append-only
/// accumulator and `streaming` is `true`. The flag is cleared exactly once
/// when the stream ends, on every exit path (clean completion, upstream
/// failure, or a local read error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message, assigned at creation.
    pub id: Uuid,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// Whether this message is still being built from a live stream.
    #[serde(default)]
    pub streaming: bool,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            streaming: false,
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates an empty assistant message with the streaming flag set,
    /// ready to accumulate content events.
    pub fn streaming() -> Self {
        let mut msg = Self::new(Role::Assistant, "");
        msg.streaming = true;
        msg
    }

    /// Appends incremental text to the message content.
    pub fn push_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Clears the streaming flag. Idempotent; callers guarantee it runs on
    /// every stream exit path.
    pub fn finish(&mut self) {
        self.streaming = false;
    }
}
