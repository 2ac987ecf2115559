//! Conversational core for Buzz.
//!
//! Holds per-session message history, composes requests around the fixed
//! social-media system instruction, and talks to the hosted completion
//! service.

pub mod completion;
pub mod controller;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use completion::{CompletionClient, GroqClient};
pub use controller::{ConversationController, TurnOutcome, TurnState};
pub use error::{ChatError, CompletionError};
pub use orchestrator::{ChatOrchestrator, SessionSummary, TurnReport};
pub use prompt::{HistoryWindow, PromptComposer, PLATFORMS, REFUSAL_MESSAGE, TOPICS};
pub use session::SessionStore;
