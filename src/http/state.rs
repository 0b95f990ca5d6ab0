use crate::relay::RelayHandle;
use std::time::Duration;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the relay coordinator that owns all session state
    pub relay: RelayHandle,

    /// How often idle WebSocket connections are pinged
    pub ping_interval: Duration,
}

impl AppState {
    pub fn new(relay: RelayHandle, ping_interval: Duration) -> Self {
        Self {
            relay,
            ping_interval,
        }
    }
}
