use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/record/start", post(handlers::start_recording))
        .route("/record/pause", post(handlers::pause_recording))
        .route("/record/resume", post(handlers::resume_recording))
        .route("/record/stop", post(handlers::stop_recording))
        .route("/record/retry", post(handlers::retry_ingest))
        .route("/record/camera", post(handlers::open_camera))
        .route("/record/status", get(handlers::record_status))
        // Memo review
        .route("/memos/:id", get(handlers::get_memo))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
