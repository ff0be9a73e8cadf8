//! Application error type mapping to HTTP status codes.
//!
//! The outward contract is a flat `{ "error": "..." }` payload on any
//! failure: this subsystem surfaces failures as values, never by
//! terminating the process or leaking a raw panic to the transport.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ThreadError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from thread assembly, persistence, or the turn processor.
    Thread(ThreadError),
    /// Request validation error.
    Validation(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ThreadError> for AppError {
    fn from(e: ThreadError) -> Self {
        match e {
            ThreadError::InvalidSession(msg) => AppError::Validation(msg),
            other => AppError::Thread(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Thread(ThreadError::Turn(e)) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Thread(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
