use crate::protocol::{AckFrame, ServerEvent, Transport};
use crate::session::ConnectionId;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Sending half of a connection's outbound queue (serialized JSON frames)
pub type Outbox = mpsc::Sender<String>;

/// Outbound queues of all live connections
///
/// Delivery uses `try_send`: a full queue drops the message for that client
/// only, so one slow reader cannot stall the coordinator.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    outboxes: HashMap<ConnectionId, Outbox>,
    dropped: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already registered (the old outbox is replaced)
    pub fn register(&mut self, conn_id: ConnectionId, outbox: Outbox) -> bool {
        self.outboxes.insert(conn_id, outbox).is_none()
    }

    /// Dropping the outbox closes the connection's writer
    pub fn unregister(&mut self, conn_id: &ConnectionId) -> bool {
        self.outboxes.remove(conn_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Messages dropped because a queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Send an acknowledgement back to the requesting connection
    pub fn reply(&mut self, conn_id: &ConnectionId, ack: &AckFrame) -> bool {
        match encode(ack) {
            Some(text) => self.send_text(conn_id, text),
            None => false,
        }
    }

    fn send_text(&mut self, conn_id: &ConnectionId, text: String) -> bool {
        let Some(outbox) = self.outboxes.get(conn_id) else {
            debug!("No outbox for {}, dropping message", conn_id);
            return false;
        };

        match outbox.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                self.dropped += 1;
                warn!(
                    "Send queue full for {}, dropping message ({} bytes)",
                    conn_id,
                    msg.len()
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Outbox closed for {}", conn_id);
                false
            }
        }
    }
}

impl Transport for ConnectionRegistry {
    fn emit(&mut self, to: &ConnectionId, event: &ServerEvent) {
        if let Some(text) = encode(event) {
            self.send_text(to, text);
        }
    }

    // Encode once for the whole room.
    fn broadcast(
        &mut self,
        members: &[ConnectionId],
        except: Option<&ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        let Some(text) = encode(event) else {
            return 0;
        };

        let mut recipients = 0;
        for member in members {
            if Some(member) == except {
                continue;
            }
            self.send_text(member, text.clone());
            recipients += 1;
        }
        recipients
    }
}

fn encode<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to encode outbound message: {}", e);
            None
        }
    }
}
