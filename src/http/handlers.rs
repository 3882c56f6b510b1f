use super::state::AppState;
use crate::ingest::IngestOutcome;
use crate::session::{SessionError, SessionStatus};
use crate::store::MemoRecord;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: String,
    pub memo_id: String,
    pub review_path: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::SessionActive | SessionError::NoActiveSession => StatusCode::CONFLICT,
        SessionError::NothingToRetry => StatusCode::NOT_FOUND,
        SessionError::Ingest(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: SessionError) -> axum::response::Response {
    (
        error_status(&e),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

fn stop_response(outcome: IngestOutcome) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(StopResponse {
            status: "saved".to_string(),
            memo_id: outcome.memo_id,
            review_path: outcome.review_path,
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /record/start
/// Request a new recording session
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.start().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ControlResponse {
                status: "starting".to_string(),
                message: "Recording start requested".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            error_response(e)
        }
    }
}

/// POST /record/pause
pub async fn pause_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.pause().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ControlResponse {
                status: "pausing".to_string(),
                message: "Pause requested".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /record/resume
pub async fn resume_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.resume().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ControlResponse {
                status: "resuming".to_string(),
                message: "Resume requested".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /record/stop
/// Stop the session; blocks until the transcript is persisted and answers
/// with the review destination
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.stop().await {
        Ok(outcome) => {
            info!("Recording saved: {}", outcome.review_path);
            stop_response(outcome)
        }
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            error_response(e)
        }
    }
}

/// POST /record/retry
/// Re-run ingestion for the artifact preserved by a failed stop
pub async fn retry_ingest(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.retry_ingest().await {
        Ok(outcome) => stop_response(outcome),
        Err(e) => {
            error!("Retry failed: {}", e);
            error_response(e)
        }
    }
}

/// POST /record/camera
/// Ask the host to capture a photo for the active session
pub async fn open_camera(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.capture_photo().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ControlResponse {
                status: "camera-requested".to_string(),
                message: "Camera open requested".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /record/status
pub async fn record_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.controller.status().await)
}

/// GET /memos/:id
pub async fn get_memo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MemoRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&id).await {
        Some(record) => Ok(Json(record)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Memo {} not found", id),
            }),
        )),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
