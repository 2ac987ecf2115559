//! Error types for the conversational interface.

use buzz_core::error::BuzzError;

/// Errors from the chat engine.
///
/// None of these touch the session history: a rejected input leaves the
/// transcript exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("a request is already in flight for this session")]
    TurnInFlight,
    #[error("no request is in flight for this session")]
    NoPendingTurn,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures of the completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// No API key is available. Fatal at startup.
    #[error("no API key configured: {0} is not set")]
    Auth(String),
    /// The remote call failed for any reason. Recovered per turn.
    #[error("{0}")]
    Upstream(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Upstream(err.to_string())
    }
}

impl From<ChatError> for BuzzError {
    fn from(err: ChatError) -> Self {
        BuzzError::Chat(err.to_string())
    }
}

impl From<CompletionError> for BuzzError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Auth(var) => BuzzError::MissingCredential(var),
            CompletionError::Upstream(msg) => BuzzError::Chat(msg),
        }
    }
}
