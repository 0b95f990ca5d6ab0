use super::registry::{ConnectionRegistry, Outbox};
use crate::config::RelayConfig;
use crate::protocol::SessionProtocol;
use crate::session::{ConnectionId, CreateOutcome, PlaybackEvent, SessionStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Read-only view of a session returned to HTTP handlers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub video_url: String,
    pub users: Vec<ConnectionId>,
    pub created_at: DateTime<Utc>,
}

/// Relay-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub sessions: usize,
    pub connections: usize,
    pub memberships: usize,
    pub dropped_messages: u64,
}

/// Work items processed by the coordinator, one at a time
#[derive(Debug)]
pub enum RelayCommand {
    Connect {
        conn_id: ConnectionId,
        outbox: Outbox,
    },
    Disconnect {
        conn_id: ConnectionId,
    },
    /// Raw text frame received from a connection
    Inbound {
        conn_id: ConnectionId,
        text: String,
    },
    CreateSession {
        session_id: String,
        video_url: String,
        reply: oneshot::Sender<CreateOutcome>,
    },
    GetSession {
        session_id: String,
        reply: oneshot::Sender<Option<SessionInfo>>,
    },
    LastEvent {
        session_id: String,
        reply: oneshot::Sender<Option<PlaybackEvent>>,
    },
    Events {
        session_id: String,
        reply: oneshot::Sender<Vec<PlaybackEvent>>,
    },
    EndSession {
        session_id: String,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<RelayStats>,
    },
}

/// Cloneable handle used by the transport and HTTP layers to reach the coordinator
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
    send_queue_capacity: usize,
}

impl RelayHandle {
    /// Register a new connection and return the receiving end of its outbound queue
    pub async fn connect(&self, conn_id: ConnectionId) -> Result<mpsc::Receiver<String>> {
        let (outbox, rx) = mpsc::channel(self.send_queue_capacity);
        self.send(RelayCommand::Connect { conn_id, outbox }).await?;
        Ok(rx)
    }

    pub async fn disconnect(&self, conn_id: ConnectionId) -> Result<()> {
        self.send(RelayCommand::Disconnect { conn_id }).await
    }

    pub async fn inbound(&self, conn_id: ConnectionId, text: String) -> Result<()> {
        self.send(RelayCommand::Inbound { conn_id, text }).await
    }

    pub async fn create_session(
        &self,
        session_id: String,
        video_url: String,
    ) -> Result<CreateOutcome> {
        self.request(|reply| RelayCommand::CreateSession {
            session_id,
            video_url,
            reply,
        })
        .await
    }

    pub async fn get_session(&self, session_id: String) -> Result<Option<SessionInfo>> {
        self.request(|reply| RelayCommand::GetSession { session_id, reply })
            .await
    }

    pub async fn last_event(&self, session_id: String) -> Result<Option<PlaybackEvent>> {
        self.request(|reply| RelayCommand::LastEvent { session_id, reply })
            .await
    }

    pub async fn events(&self, session_id: String) -> Result<Vec<PlaybackEvent>> {
        self.request(|reply| RelayCommand::Events { session_id, reply })
            .await
    }

    pub async fn end_session(&self, session_id: String) -> Result<bool> {
        self.request(|reply| RelayCommand::EndSession { session_id, reply })
            .await
    }

    pub async fn stats(&self) -> Result<RelayStats> {
        self.request(|reply| RelayCommand::Stats { reply }).await
    }

    async fn send(&self, command: RelayCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("Relay coordinator has stopped"))
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> RelayCommand,
    ) -> Result<R> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.context("Relay coordinator dropped the request")
    }
}

/// The coordinating task: sole owner of session state and connection queues
pub struct Relay {
    protocol: SessionProtocol,
    connections: ConnectionRegistry,
    commands: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    /// Spawn the coordinator on the current runtime.
    ///
    /// The task exits once every `RelayHandle` has been dropped.
    pub fn spawn(config: &RelayConfig) -> (RelayHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(config.command_queue_capacity.max(1));

        let relay = Relay {
            protocol: SessionProtocol::new(SessionStore::with_history_limit(config.history_limit)),
            connections: ConnectionRegistry::new(),
            commands,
        };

        let handle = RelayHandle {
            tx,
            send_queue_capacity: config.send_queue_capacity.max(1),
        };

        (handle, tokio::spawn(relay.run()))
    }

    async fn run(mut self) {
        info!("Relay coordinator started");

        while let Some(command) = self.commands.recv().await {
            self.dispatch(command);
        }

        info!("Relay coordinator stopped");
    }

    fn dispatch(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Connect { conn_id, outbox } => {
                if !self.connections.register(conn_id.clone(), outbox) {
                    warn!("Connection {} registered twice, replacing outbox", conn_id);
                }
                self.protocol.connect(&conn_id);
            }
            RelayCommand::Disconnect { conn_id } => {
                self.connections.unregister(&conn_id);
                self.protocol.disconnect(&conn_id, &mut self.connections);
            }
            RelayCommand::Inbound { conn_id, text } => {
                if let Some(ack) = self
                    .protocol
                    .handle_frame(&conn_id, &text, &mut self.connections)
                {
                    self.connections.reply(&conn_id, &ack);
                }
            }
            RelayCommand::CreateSession {
                session_id,
                video_url,
                reply,
            } => {
                let _ = reply.send(self.protocol.create_session(&session_id, &video_url));
            }
            RelayCommand::GetSession { session_id, reply } => {
                let info = self
                    .protocol
                    .store()
                    .get_session(&session_id)
                    .map(|s| SessionInfo {
                        video_url: s.video_url().to_string(),
                        users: s.members().to_vec(),
                        created_at: s.created_at(),
                    });
                let _ = reply.send(info);
            }
            RelayCommand::LastEvent { session_id, reply } => {
                let _ = reply.send(self.protocol.store().last_event(&session_id).cloned());
            }
            RelayCommand::Events { session_id, reply } => {
                let _ = reply.send(self.protocol.store().events(&session_id));
            }
            RelayCommand::EndSession { session_id, reply } => {
                let _ = reply.send(self.protocol.end_session(&session_id));
            }
            RelayCommand::Stats { reply } => {
                let store = self.protocol.store();
                let _ = reply.send(RelayStats {
                    sessions: store.len(),
                    connections: self.connections.len(),
                    memberships: store.member_count(),
                    dropped_messages: self.connections.dropped(),
                });
            }
        }
    }
}
