use super::messages::{
    AckFrame, ClientFrame, ClientMessage, JoinReply, JoinSnapshot, MembershipUpdate,
    RelayedControl, ServerEvent, VideoControl, INVALID_JOIN_PAYLOAD, JOIN_SESSION,
};
use super::transport::Transport;
use crate::error::ProtocolError;
use crate::session::{ConnectionId, CreateOutcome, PlaybackAction, SessionStore};
use tracing::{debug, info, warn};

/// Connection-event handlers for watch sessions
///
/// Owns the `SessionStore`; every handler runs to completion against it and
/// hands outbound events to the supplied `Transport`.
#[derive(Debug, Default)]
pub struct SessionProtocol {
    store: SessionStore,
}

impl SessionProtocol {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create (or overwrite) a session record
    pub fn create_session(&mut self, session_id: &str, video_url: &str) -> CreateOutcome {
        let outcome = self.store.create_session(session_id, video_url);
        match &outcome {
            CreateOutcome::Created => {
                info!("Created session {} for {}", session_id, video_url);
            }
            CreateOutcome::Replaced { evicted_members } => {
                warn!(
                    "Session {} re-created for {}, dropped {} member(s)",
                    session_id,
                    video_url,
                    evicted_members.len()
                );
            }
        }
        outcome
    }

    /// Mark a session as ended so late joiners start from the beginning
    pub fn end_session(&mut self, session_id: &str) -> bool {
        let ended = self.store.append_event(session_id, PlaybackAction::End, 0.0);
        if ended {
            info!("Session {} ended", session_id);
        }
        ended
    }

    /// A transport connection was opened. No session side effects.
    pub fn connect(&self, conn_id: &ConnectionId) {
        info!("Client connected: {}", conn_id);
    }

    /// Decode and dispatch one client frame.
    ///
    /// Returns the acknowledgement to send back, if the frame asked for one.
    /// Malformed input is logged and dropped.
    pub fn handle_frame<T: Transport + ?Sized>(
        &mut self,
        conn_id: &ConnectionId,
        text: &str,
        transport: &mut T,
    ) -> Option<AckFrame> {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping frame from {}: {}", conn_id, e);
                return None;
            }
        };

        let message = match ClientMessage::decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping {} from {}: {}", frame.event, conn_id, e);
                return match e {
                    ProtocolError::MalformedPayload {
                        event: JOIN_SESSION,
                        ..
                    } => frame.ack.map(|ack| AckFrame {
                        ack,
                        data: JoinReply::error(INVALID_JOIN_PAYLOAD),
                    }),
                    _ => None,
                };
            }
        };

        match message {
            ClientMessage::JoinSession { session_id } => {
                let reply = self.join(conn_id, &session_id, transport);
                frame.ack.map(|ack| AckFrame { ack, data: reply })
            }
            ClientMessage::VideoControl {
                session_id,
                control,
            } => {
                self.video_control(conn_id, &session_id, control, transport);
                None
            }
        }
    }

    /// Join `conn_id` to a session and return the playback snapshot.
    ///
    /// Other members are notified before the snapshot is taken, and the
    /// snapshot's member list includes the joiner.
    pub fn join<T: Transport + ?Sized>(
        &mut self,
        conn_id: &ConnectionId,
        session_id: &str,
        transport: &mut T,
    ) -> JoinReply {
        // No-op for unknown sessions; the lookup below reports those.
        self.store.add_member(session_id, conn_id);

        let Some(session) = self.store.get_session(session_id) else {
            let err = ProtocolError::SessionNotFound {
                session_id: session_id.to_string(),
            };
            warn!("Join from {} rejected: {} ({})", conn_id, err, session_id);
            return JoinReply::error(err.to_string());
        };
        let users = session.members().to_vec();

        let event = ServerEvent::UserJoined(MembershipUpdate {
            user_id: conn_id.clone(),
            users: users.clone(),
        });
        let notified = transport.broadcast(&users, Some(conn_id), &event);

        info!(
            "{} joined session {} ({} member(s), {} notified)",
            conn_id,
            session_id,
            users.len(),
            notified
        );

        let last = session.last_event();
        JoinReply::Snapshot(JoinSnapshot {
            video_url: session.video_url().to_string(),
            users,
            progress: last.map(|e| e.progress).unwrap_or(0.0),
            is_playing: last.map(|e| e.action.is_playing()).unwrap_or(false),
        })
    }

    /// Remove a closed connection from every session that held it.
    ///
    /// Returns the number of sessions it left.
    pub fn disconnect<T: Transport + ?Sized>(
        &mut self,
        conn_id: &ConnectionId,
        transport: &mut T,
    ) -> usize {
        info!("Client disconnected: {}", conn_id);

        let session_ids = self.store.sessions_of(conn_id);
        for session_id in &session_ids {
            if !self.store.remove_member(session_id, conn_id) {
                continue;
            }
            let Some(session) = self.store.get_session(session_id) else {
                continue;
            };

            let remaining = session.members();
            let event = ServerEvent::UserLeft(MembershipUpdate {
                user_id: conn_id.clone(),
                users: remaining.to_vec(),
            });
            transport.broadcast(remaining, None, &event);

            debug!(
                "{} left session {} ({} remaining)",
                conn_id,
                session_id,
                remaining.len()
            );
        }

        session_ids.len()
    }

    /// Record a control event and relay it to the other members.
    ///
    /// Events for unknown sessions are dropped without a broadcast.
    pub fn video_control<T: Transport + ?Sized>(
        &mut self,
        conn_id: &ConnectionId,
        session_id: &str,
        control: VideoControl,
        transport: &mut T,
    ) -> bool {
        if !self
            .store
            .append_event(session_id, control.action, control.progress)
        {
            warn!(
                "Dropping videoControl from {}: session {} not found",
                conn_id, session_id
            );
            return false;
        }

        let Some(session) = self.store.get_session(session_id) else {
            return false;
        };

        let event = ServerEvent::VideoControl(RelayedControl {
            user_id: conn_id.clone(),
            video_control: control,
        });
        let relayed = transport.broadcast(session.members(), Some(conn_id), &event);

        debug!(
            "Relayed {} ({}) from {} in session {} to {} member(s)",
            control.action, control.progress, conn_id, session_id, relayed
        );
        true
    }
}
