//! Chat orchestrator: owns one conversation controller per session.
//!
//! Sessions are keyed by UUID and end after a configurable idle period.
//! The session map lock is only held to start and to finish a turn; the
//! completion call itself runs on a spawned task without it, so a turn
//! always completes even if the caller goes away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use buzz_core::config::ChatConfig;
use buzz_core::types::Message;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::completion::CompletionClient;
use crate::controller::{validate_input, ConversationController, TurnOutcome, TurnState};
use crate::error::ChatError;
use crate::prompt::{HistoryWindow, PromptComposer};

/// Result of [`ChatOrchestrator::handle_message`].
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub session_id: Uuid,
    /// Whether this turn started a new session.
    pub new_session: bool,
    pub outcome: TurnOutcome,
}

/// Snapshot of a live session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: i64,
    pub last_activity_at: i64,
    pub message_count: usize,
    pub pending: bool,
}

struct SessionEntry {
    controller: ConversationController,
    started_at: i64,
    last_activity_at: i64,
}

impl SessionEntry {
    fn touch(&mut self) {
        self.last_activity_at = Utc::now().timestamp();
    }

    fn is_expired(&self, now: i64, timeout_secs: i64) -> bool {
        self.controller.state() == TurnState::Idle && now - self.last_activity_at > timeout_secs
    }
}

type SessionMap = HashMap<Uuid, SessionEntry>;

/// Central coordinator for all chat sessions in the process.
pub struct ChatOrchestrator {
    client: Arc<dyn CompletionClient>,
    sessions: Arc<Mutex<SessionMap>>,
    window: HistoryWindow,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator sharing `client` across every session.
    pub fn new(client: Arc<dyn CompletionClient>, config: ChatConfig) -> Self {
        Self {
            client,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            window: HistoryWindow::from_setting(config.history_window),
            config,
        }
    }

    /// Model identifier of the shared client.
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Run one turn for `message`.
    ///
    /// A missing, unknown or expired `session_id` starts a new session.
    /// Upstream failures are reported through [`TurnOutcome::Failed`], not
    /// as an `Err`.
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<TurnReport, ChatError> {
        validate_input(message, self.config.max_message_chars)?;

        let (sid, new_session, request, client) = {
            let mut sessions = lock(&self.sessions)?;
            let (sid, new_session) = self.resolve_session(&mut sessions, session_id);
            let entry = sessions
                .get_mut(&sid)
                .ok_or(ChatError::SessionNotFound(sid))?;
            let request = entry.controller.begin_turn(message)?;
            entry.touch();
            (sid, new_session, request, entry.controller.client())
        };

        tracing::debug!(session_id = %sid, request_len = request.len(), "Turn started");

        let sessions = Arc::clone(&self.sessions);
        let task = tokio::spawn(async move {
            let result = client.complete(&request).await;
            let mut sessions = lock(&sessions)?;
            let entry = sessions
                .get_mut(&sid)
                .ok_or(ChatError::SessionNotFound(sid))?;
            entry.touch();
            entry.controller.finish_turn(result)
        });

        let outcome = task
            .await
            .map_err(|e| ChatError::Internal(format!("turn task failed: {}", e)))??;

        match &outcome {
            TurnOutcome::Answered(_) => tracing::info!(session_id = %sid, "Turn answered"),
            TurnOutcome::Failed(_) => tracing::info!(session_id = %sid, "Turn failed upstream"),
        }

        Ok(TurnReport {
            session_id: sid,
            new_session,
            outcome,
        })
    }

    /// The visible transcript of a session.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<Message>, ChatError> {
        let mut sessions = lock(&self.sessions)?;
        let entry = self.live_entry(&mut sessions, session_id)?;
        Ok(entry.controller.history().to_vec())
    }

    /// Clear a session's transcript. The session itself stays alive.
    pub fn reset_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = lock(&self.sessions)?;
        let entry = self.live_entry(&mut sessions, session_id)?;
        entry.controller.reset()?;
        entry.touch();
        tracing::info!(session_id = %session_id, "Session history cleared");
        Ok(())
    }

    /// Get a snapshot of one session.
    pub fn get_session(&self, session_id: Uuid) -> Result<SessionSummary, ChatError> {
        let mut sessions = lock(&self.sessions)?;
        let entry = self.live_entry(&mut sessions, session_id)?;
        Ok(summarize(session_id, entry))
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        lock(&self.sessions).map(|s| s.len()).unwrap_or(0)
    }

    /// Drop every idle session past the timeout. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let timeout_secs = self.timeout_secs();
        let now = Utc::now().timestamp();
        let mut sessions = match lock(&self.sessions) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Cannot sweep sessions");
                return 0;
            }
        };
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, timeout_secs));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = sessions.len(), "Expired sessions swept");
        }
        removed
    }

    // -- Private helpers --

    fn timeout_secs(&self) -> i64 {
        i64::from(self.config.session_timeout_minutes) * 60
    }

    /// Look up a session that has not timed out.
    ///
    /// Expired sessions that the sweep has not reached yet are reported as
    /// missing, the same as in [`Self::handle_message`].
    fn live_entry<'a>(
        &self,
        sessions: &'a mut SessionMap,
        session_id: Uuid,
    ) -> Result<&'a mut SessionEntry, ChatError> {
        let now = Utc::now().timestamp();
        match sessions.get_mut(&session_id) {
            Some(entry) if !entry.is_expired(now, self.timeout_secs()) => Ok(entry),
            _ => Err(ChatError::SessionNotFound(session_id)),
        }
    }

    /// Reuse a live session or create a new one.
    fn resolve_session(&self, sessions: &mut SessionMap, requested: Option<Uuid>) -> (Uuid, bool) {
        if let Some(sid) = requested {
            match sessions.get(&sid) {
                Some(entry) if !entry.is_expired(Utc::now().timestamp(), self.timeout_secs()) => {
                    return (sid, false);
                }
                Some(_) => {
                    tracing::debug!(session_id = %sid, "Session expired; starting a new one");
                    sessions.remove(&sid);
                }
                None => {}
            }
        }

        let now = Utc::now().timestamp();
        let sid = Uuid::new_v4();
        let controller = ConversationController::new(
            Arc::clone(&self.client),
            PromptComposer::new(self.window),
            self.config.max_message_chars,
        );
        sessions.insert(
            sid,
            SessionEntry {
                controller,
                started_at: now,
                last_activity_at: now,
            },
        );
        tracing::info!(session_id = %sid, "Session started");
        (sid, true)
    }
}

fn lock(sessions: &Mutex<SessionMap>) -> Result<MutexGuard<'_, SessionMap>, ChatError> {
    sessions
        .lock()
        .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))
}

fn summarize(id: Uuid, entry: &SessionEntry) -> SessionSummary {
    SessionSummary {
        id,
        started_at: entry.started_at,
        last_activity_at: entry.last_activity_at,
        message_count: entry.controller.history().len(),
        pending: entry.controller.state() == TurnState::Pending,
    }
}

// =============================================================================
// Tests
// =============================================================================
