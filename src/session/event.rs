use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback action carried by a control event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackAction {
    Play,
    Pause,
    Seek,
    /// Session was ended; late joiners start from the beginning
    End,
}

impl PlaybackAction {
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackAction::Play)
    }
}

impl fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PlaybackAction::Play => "PLAY",
            PlaybackAction::Pause => "PAUSE",
            PlaybackAction::Seek => "SEEK",
            PlaybackAction::End => "END",
        };
        f.write_str(tag)
    }
}

/// A recorded playback-control event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    /// What the player did
    #[serde(rename = "type")]
    pub action: PlaybackAction,

    /// Playback position as reported by the client
    pub progress: f64,

    /// When the relay recorded this event
    #[serde(rename = "createdAt")]
    pub recorded_at: DateTime<Utc>,
}

impl PlaybackEvent {
    pub fn new(action: PlaybackAction, progress: f64) -> Self {
        Self {
            action,
            progress,
            recorded_at: Utc::now(),
        }
    }
}
