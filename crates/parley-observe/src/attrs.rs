//! Span attribute constants for chat and persistence instrumentation.
//!
//! Follows the OTel GenAI Semantic Conventions where they apply, plus
//! service-local attributes for the thread persistence subsystem. All
//! constants are string slices usable in `tracing::span!` and
//! `tracing::info_span!` field names.

// --- GenAI semantic convention attributes ---

/// The name of the operation being performed (e.g., "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The model ID requested for the turn.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

// --- Service-local attributes ---

/// The caller-supplied session identifier.
pub const PARLEY_SESSION_ID: &str = "parley.session_id";

/// The thread identifier resolved for the request.
pub const PARLEY_THREAD_ID: &str = "parley.thread_id";

/// Number of messages persisted by a save.
pub const PARLEY_MESSAGES_PERSISTED: &str = "parley.messages_persisted";

/// Whether the thread info lookup was served from cache.
pub const PARLEY_CACHE_HIT: &str = "parley.cache_hit";
