//! HTTP API and WebSocket endpoint
//!
//! - POST /session - Create (or overwrite) a watch session
//! - GET /session/:id - Look up a session's video URL
//! - GET /session/:id/lastVideoEvent - Most recent playback event
//! - GET /session/:id/videoControls - Retained playback history
//! - POST /session/:id/end - End a session
//! - GET /ws - Real-time session protocol (WebSocket)
//! - GET /stats - Relay counters
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
