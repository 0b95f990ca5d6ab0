use super::connection::ConnectionId;
use super::event::{PlaybackAction, PlaybackEvent};
use super::session::Session;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Events retained per session unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Result of `SessionStore::create_session`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// No session existed under this id
    Created,
    /// An existing session was overwritten; its members were dropped
    Replaced { evicted_members: Vec<ConnectionId> },
}

/// Authoritative in-memory registry of watch sessions
///
/// The store is not synchronized. It is owned by the relay coordinator task and
/// every operation runs to completion before the next command is processed.
#[derive(Debug)]
pub struct SessionStore {
    /// Session id → session
    sessions: HashMap<String, Session>,

    /// Connection → ids of the sessions it is a member of
    memberships: HashMap<ConnectionId, BTreeSet<String>>,

    history_limit: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a store keeping at most `history_limit` events per session (minimum 1)
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            memberships: HashMap::new(),
            history_limit: history_limit.max(1),
        }
    }

    /// Insert a fresh session, overwriting any existing one with the same id
    pub fn create_session(&mut self, session_id: &str, video_url: &str) -> CreateOutcome {
        let fresh = Session::new(video_url.to_string(), self.history_limit);

        match self.sessions.insert(session_id.to_string(), fresh) {
            None => CreateOutcome::Created,
            Some(previous) => {
                let evicted_members = previous.members().to_vec();
                for conn_id in &evicted_members {
                    self.unindex(conn_id, session_id);
                }
                CreateOutcome::Replaced { evicted_members }
            }
        }
    }

    pub fn get_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Add a member to an existing session.
    ///
    /// Returns false when the session is unknown or the connection is already a member.
    pub fn add_member(&mut self, session_id: &str, conn_id: &ConnectionId) -> bool {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return false;
        };
        if !session.add_member(conn_id.clone()) {
            return false;
        }

        self.memberships
            .entry(conn_id.clone())
            .or_default()
            .insert(session_id.to_string());
        true
    }

    /// Remove a member from a session.
    ///
    /// Returns false when the session is unknown or the connection was not a member.
    pub fn remove_member(&mut self, session_id: &str, conn_id: &ConnectionId) -> bool {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return false;
        };
        if !session.remove_member(conn_id) {
            return false;
        }

        self.unindex(conn_id, session_id);
        true
    }

    /// Record a playback event. No-op (returns false) for unknown sessions.
    pub fn append_event(&mut self, session_id: &str, action: PlaybackAction, progress: f64) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.push_event(action, progress);
                debug!("Recorded {} at {} for session {}", action, progress, session_id);
                true
            }
            None => false,
        }
    }

    pub fn last_event(&self, session_id: &str) -> Option<&PlaybackEvent> {
        self.sessions.get(session_id)?.last_event()
    }

    /// Retained events for a session, oldest first (empty if unknown)
    pub fn events(&self, session_id: &str) -> Vec<PlaybackEvent> {
        self.sessions
            .get(session_id)
            .map(|s| s.events().cloned().collect())
            .unwrap_or_default()
    }

    /// Sessions the connection currently belongs to, sorted by id
    pub fn sessions_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.memberships
            .get(conn_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Total number of (session, member) pairs
    pub fn member_count(&self) -> usize {
        self.memberships.values().map(BTreeSet::len).sum()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    fn unindex(&mut self, conn_id: &ConnectionId, session_id: &str) {
        if let Some(ids) = self.memberships.get_mut(conn_id) {
            ids.remove(session_id);
            if ids.is_empty() {
                self.memberships.remove(conn_id);
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
