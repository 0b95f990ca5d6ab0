use crate::error::ProtocolError;
use crate::session::{ConnectionId, PlaybackAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JOIN_SESSION: &str = "joinSession";
pub const VIDEO_CONTROL: &str = "videoControl";

/// Reply text for a join request whose payload could not be decoded
pub const INVALID_JOIN_PAYLOAD: &str = "Invalid joinSession payload";

// ============================================================================
// Client → Server
// ============================================================================

/// Raw frame sent by a client over the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Event name (`joinSession`, `videoControl`)
    pub event: String,

    /// Positional event arguments
    #[serde(default)]
    pub args: Vec<Value>,

    /// Acknowledgement id; when set the server answers with a matching `ack` frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Playback control as sent by a client and relayed to the others
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoControl {
    #[serde(rename = "type")]
    pub action: PlaybackAction,
    pub progress: f64,
}

/// Decoded client message
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    JoinSession {
        session_id: String,
    },
    VideoControl {
        session_id: String,
        control: VideoControl,
    },
}

impl ClientMessage {
    /// Validate the event name and argument shape of a frame
    pub fn decode(frame: &ClientFrame) -> Result<Self, ProtocolError> {
        match frame.event.as_str() {
            JOIN_SESSION => {
                let [session_id] = frame.args.as_slice() else {
                    return Err(ProtocolError::malformed(
                        JOIN_SESSION,
                        format!("expected 1 argument, got {}", frame.args.len()),
                    ));
                };
                Ok(ClientMessage::JoinSession {
                    session_id: session_id_arg(JOIN_SESSION, session_id)?,
                })
            }
            VIDEO_CONTROL => {
                let [session_id, control] = frame.args.as_slice() else {
                    return Err(ProtocolError::malformed(
                        VIDEO_CONTROL,
                        format!("expected 2 arguments, got {}", frame.args.len()),
                    ));
                };
                let session_id = session_id_arg(VIDEO_CONTROL, session_id)?;
                let control = VideoControl::deserialize(control)
                    .map_err(|e| ProtocolError::malformed(VIDEO_CONTROL, e.to_string()))?;
                Ok(ClientMessage::VideoControl {
                    session_id,
                    control,
                })
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

fn session_id_arg(event: &'static str, value: &Value) -> Result<String, ProtocolError> {
    // Any string is a valid id; whether the session exists is the store's call.
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ProtocolError::malformed(event, "session id must be a string"))
}

// ============================================================================
// Server → Client
// ============================================================================

/// Membership change payload for `userJoined` / `userLeft`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipUpdate {
    pub user_id: ConnectionId,
    pub users: Vec<ConnectionId>,
}

/// Control event relayed from one member to the others
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedControl {
    pub user_id: ConnectionId,
    pub video_control: VideoControl,
}

/// Event pushed to members of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "userJoined")]
    UserJoined(MembershipUpdate),
    #[serde(rename = "userLeft")]
    UserLeft(MembershipUpdate),
    #[serde(rename = "videoControl")]
    VideoControl(RelayedControl),
}

/// State handed to a connection that just joined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSnapshot {
    pub video_url: String,
    pub users: Vec<ConnectionId>,
    pub progress: f64,
    pub is_playing: bool,
}

/// Answer to `joinSession`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinReply {
    Snapshot(JoinSnapshot),
    Error { error: String },
}

impl JoinReply {
    pub fn error(message: impl Into<String>) -> Self {
        JoinReply::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JoinReply::Error { .. })
    }
}

/// Acknowledgement frame answering a client frame that carried an `ack` id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckFrame {
    pub ack: u64,
    pub data: JoinReply,
}
