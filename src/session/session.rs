use super::connection::ConnectionId;
use super::event::{PlaybackAction, PlaybackEvent};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// A shared-playback context: one video, its members, and recent control events
#[derive(Debug, Clone)]
pub struct Session {
    /// Video every member is watching (fixed at creation)
    video_url: String,

    /// Connected members in join order, no duplicates
    members: Vec<ConnectionId>,

    /// Most recent playback events, oldest first
    history: VecDeque<PlaybackEvent>,

    /// Maximum number of events kept in `history`
    history_limit: usize,

    /// When the session was created
    created_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(video_url: String, history_limit: usize) -> Self {
        let history_limit = history_limit.max(1);
        Self {
            video_url,
            members: Vec::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
            created_at: Utc::now(),
        }
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn is_member(&self, conn_id: &ConnectionId) -> bool {
        self.members.contains(conn_id)
    }

    /// Returns false if the connection was already a member
    pub(crate) fn add_member(&mut self, conn_id: ConnectionId) -> bool {
        if self.is_member(&conn_id) {
            return false;
        }
        self.members.push(conn_id);
        true
    }

    /// Returns false if the connection was not a member
    pub(crate) fn remove_member(&mut self, conn_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != conn_id);
        self.members.len() != before
    }

    pub(crate) fn push_event(&mut self, action: PlaybackAction, progress: f64) {
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(PlaybackEvent::new(action, progress));
    }

    pub fn last_event(&self) -> Option<&PlaybackEvent> {
        self.history.back()
    }

    /// Retained events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &PlaybackEvent> {
        self.history.iter()
    }
}
