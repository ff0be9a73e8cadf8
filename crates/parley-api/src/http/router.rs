//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing. The chat endpoints are unversioned;
//! this service sits behind an internal gateway that owns auth and routing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route(
            "/chat/{session_id}/messages",
            get(handlers::session::get_messages),
        )
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;

    #[tokio::test]
    async fn test_router_builds() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_data_dir(dir.path().to_path_buf());
        let state = AppState::init(config).await.unwrap();

        // Route registration panics on conflicts; building is the test.
        let _router = build_router(state);
    }
}
