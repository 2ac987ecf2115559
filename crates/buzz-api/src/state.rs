//! Application state shared across all route handlers.
//!
//! Passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use buzz_chat::ChatOrchestrator;
use buzz_core::config::BuzzConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration, read-only after startup.
    pub config: Arc<BuzzConfig>,
    /// Session registry and turn driver.
    pub chat: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: BuzzConfig, chat: Arc<ChatOrchestrator>) -> Self {
        Self {
            config: Arc::new(config),
            chat,
            start_time: Instant::now(),
        }
    }
}
