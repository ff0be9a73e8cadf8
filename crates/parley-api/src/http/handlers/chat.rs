//! Chat endpoint.
//!
//! POST /chat
//!
//! One request/response cycle: assemble the session's thread, run the turn
//! processor, persist the new exchange, return the assistant's reply.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Caller-supplied session identifier.
    pub session_id: String,
}

/// Success body for the chat endpoint.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat - handle one turn of a conversation.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must be non-empty".to_string()));
    }

    let reply = state
        .thread_service
        .handle_turn(&body.session_id, message)
        .await?;

    info!(session_id = %body.session_id.trim(), "chat turn completed");
    Ok(Json(ChatResponse { reply }))
}
