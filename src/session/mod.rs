//! Watch session registry
//!
//! This module provides the in-memory `SessionStore` that owns:
//! - Session records (video URL, members, creation time)
//! - Bounded playback event history per session
//! - A connection → sessions index used on disconnect

mod connection;
mod event;
mod session;
mod store;

pub use connection::ConnectionId;
pub use event::{PlaybackAction, PlaybackEvent};
pub use session::Session;
pub use store::{CreateOutcome, SessionStore, DEFAULT_HISTORY_LIMIT};
