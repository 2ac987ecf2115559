//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/body parameters via axum extractors,
//! calls into the chat orchestrator, and returns JSON responses.

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use buzz_chat::{SessionSummary, TurnOutcome, PLATFORMS, TOPICS};
use buzz_core::types::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::page::CHAT_HTML;
use crate::state::AppState;

/// Scope notice shown above the transcript and in the sidebar.
pub const SCOPE_NOTICE: &str =
    "I exclusively provide advice on social media topics. For other subjects, please consult a different expert.";

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// Session to continue. Omitted on the first turn.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpertiseResponse {
    pub platforms: Vec<String>,
    pub topics: Vec<String>,
    pub notice: String,
}

/// Turn status reported to the chat widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    Failed,
}

/// Response for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    pub session_id: Uuid,
    pub new_session: bool,
    pub status: TurnStatus,
    /// The assistant message, present when `status` is `answered`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Message>,
    /// `Error: <description>`, present when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub session_id: Uuid,
    pub cleared: bool,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET / - serve the self-contained chat page.
pub async fn index() -> impl IntoResponse {
    Html(CHAT_HTML)
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.chat.session_count(),
        model: state.chat.model().to_string(),
    })
}

/// GET /expertise - platforms and topics the assistant covers.
pub async fn expertise() -> Json<ExpertiseResponse> {
    Json(ExpertiseResponse {
        platforms: PLATFORMS.iter().map(|p| p.to_string()).collect(),
        topics: TOPICS.iter().map(|t| t.to_string()).collect(),
        notice: SCOPE_NOTICE.to_string(),
    })
}

/// POST /chat - run one conversation turn.
///
/// Upstream failures are a normal turn result (`status: failed`), so they
/// come back as 200 with the error text for inline display.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    let report = state
        .chat
        .handle_message(&body.message, body.session_id)
        .await?;

    let response = match report.outcome {
        TurnOutcome::Answered(reply) => ChatTurnResponse {
            session_id: report.session_id,
            new_session: report.new_session,
            status: TurnStatus::Answered,
            reply: Some(reply),
            error: None,
        },
        TurnOutcome::Failed(error) => ChatTurnResponse {
            session_id: report.session_id,
            new_session: report.new_session,
            status: TurnStatus::Failed,
            reply: None,
            error: Some(error),
        },
    };

    Ok(Json(response))
}

/// GET /sessions/{id} - session metadata without the transcript.
pub async fn session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, ApiError> {
    Ok(Json(state.chat.get_session(id)?))
}

/// GET /sessions/{id}/messages - the visible transcript.
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.chat.get_history(id)?;
    Ok(Json(HistoryResponse {
        session_id: id,
        messages,
    }))
}

/// DELETE /sessions/{id}/messages - clear the transcript.
pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.chat.reset_session(id)?;
    Ok(Json(ClearResponse {
        session_id: id,
        cleared: true,
    }))
}
