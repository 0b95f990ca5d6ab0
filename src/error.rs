use thiserror::Error;

/// Reasons an inbound client frame is rejected
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("malformed {event} payload: {reason}")]
    MalformedPayload { event: &'static str, reason: String },

    #[error("Session not found")]
    SessionNotFound { session_id: String },
}

impl ProtocolError {
    pub(crate) fn malformed(event: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::MalformedPayload {
            event,
            reason: reason.into(),
        }
    }
}
