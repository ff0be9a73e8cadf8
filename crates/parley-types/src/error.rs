use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from cache tier operations.
///
/// Every variant is non-fatal by contract: callers treat a cache error
/// identically to a cache miss and fall back to the durable tier.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out")]
    Timeout,

    #[error("cache codec error: {0}")]
    Codec(String),
}

/// Errors from the turn processor boundary.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("turn provider error: {message}")]
    Provider { message: String },

    #[error("turn response decode error: {0}")]
    Decode(String),

    #[error("turn response empty")]
    Empty,
}

/// Errors surfaced by thread assembly, persistence, and turn orchestration.
#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Turn(#[from] TurnError),
}
