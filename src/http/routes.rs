use super::handlers;
use super::state::AppState;
use super::ws;
use crate::config::CorsConfig;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        // Session records
        .route("/session", post(handlers::create_session))
        .route("/session/:session_id", get(handlers::get_session))
        .route(
            "/session/:session_id/lastVideoEvent",
            get(handlers::get_last_video_event),
        )
        .route(
            "/session/:session_id/videoControls",
            get(handlers::get_video_controls),
        )
        .route("/session/:session_id/end", post(handlers::end_session))
        // Real-time protocol
        .route("/ws", get(ws::ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors)),
        )
        .with_state(state)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.allowed_origin == "*" {
        AllowOrigin::from(Any)
    } else {
        match HeaderValue::from_str(&cors.allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(
                    "Invalid CORS origin '{}' ({}), allowing any origin",
                    cors.allowed_origin, e
                );
                AllowOrigin::from(Any)
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
