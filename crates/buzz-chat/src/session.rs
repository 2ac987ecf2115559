//! Per-session message history.

use buzz_core::types::Message;

/// Ordered, append-only history of one chat session.
///
/// There is no eviction: the store grows for as long as the session lives.
/// Bounding what is sent upstream is the job of
/// [`HistoryWindow`](crate::prompt::HistoryWindow).
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    messages: Vec<Message>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the history.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in submission order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Clear the history. Calling this on an empty store is a no-op.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
