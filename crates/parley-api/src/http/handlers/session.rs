//! Session history endpoint.
//!
//! GET /chat/{session_id}/messages
//!
//! Returns the recent persisted conversational messages for a session,
//! oldest first, straight from the durable tier.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_core::thread::ThreadRepository;

use crate::http::error::AppError;
use crate::state::AppState;

/// One message of a session's history.
#[derive(Debug, Serialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Response body for the session history endpoint.
#[derive(Debug, Serialize)]
pub struct SessionMessages {
    pub session_id: String,
    pub message_count: u32,
    pub messages: Vec<SessionMessage>,
}

/// GET /chat/{session_id}/messages - recent history for a session.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionMessages>, AppError> {
    let info = state
        .thread_repo
        .find_info(&session_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("unknown session: {session_id}")))?;

    let messages = state
        .thread_repo
        .recent_messages(&info.thread_id, state.cache_window as u32)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let messages = messages
        .into_iter()
        .map(|m| SessionMessage {
            role: m.role.to_string(),
            content: m.content,
            timestamp: m.timestamp,
        })
        .collect();

    Ok(Json(SessionMessages {
        session_id,
        message_count: info.message_count,
        messages,
    }))
}
