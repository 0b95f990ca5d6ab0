use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

const SESSION_NOT_FOUND: &str = "Session not found";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub session_id: String,

    /// Video URL shared by every member
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub video_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: error.into(),
        })
    }
}

/// The coordinator only fails if it has shut down
fn relay_unavailable(e: anyhow::Error) -> axum::response::Response {
    error!("Relay request failed: {:#}", e);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorResponse::new(format!("Relay unavailable: {}", e)),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session
/// Create a session, overwriting any existing one with the same id
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    match state.relay.create_session(req.session_id, req.url).await {
        Ok(_) => (StatusCode::OK, Json(StatusResponse { status: "created" })).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// GET /session/:session_id
/// Unknown sessions answer 200 with an error body
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.relay.get_session(session_id).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(SessionResponse {
                video_url: session.video_url,
            }),
        )
            .into_response(),
        Ok(None) => (StatusCode::OK, ErrorResponse::new(SESSION_NOT_FOUND)).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// GET /session/:session_id/lastVideoEvent
/// Most recent playback event, or `null` so late joiners start from the beginning
pub async fn get_last_video_event(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.relay.last_event(session_id).await {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// GET /session/:session_id/videoControls
pub async fn get_video_controls(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.relay.events(session_id).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// POST /session/:session_id/end
/// Record an END event so the video does not keep playing for late joiners
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.relay.end_session(session_id).await {
        Ok(true) => (StatusCode::OK, Json(StatusResponse { status: "ended" })).into_response(),
        Ok(false) => (StatusCode::OK, ErrorResponse::new(SESSION_NOT_FOUND)).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => relay_unavailable(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
