//! Error types for the conversational core.

use oleh_core::OlehError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("session has ended: {0}")]
    SessionEnded(uuid::Uuid),
    #[error("session registry lock poisoned")]
    LockPoisoned,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("LLM error: {0}")]
    Llm(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode model response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}

impl From<ChatError> for OlehError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(_) | ChatError::SessionEnded(_) | ChatError::LockPoisoned => {
                OlehError::Session(err.to_string())
            }
            other => OlehError::Llm(other.to_string()),
        }
    }
}
