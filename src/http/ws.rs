use super::state::AppState;
use crate::session::ConnectionId;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Control frames are tiny; anything larger is not a protocol message
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// GET /ws
/// Upgrade to the real-time session protocol
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one WebSocket connection until it closes
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = ConnectionId::generate();

    let outbox = match state.relay.connect(conn_id.clone()).await {
        Ok(rx) => rx,
        Err(e) => {
            error!("Failed to register connection {}: {:#}", conn_id, e);
            return;
        }
    };

    let (ws_tx, mut ws_rx) = socket.split();

    // Writer task: outbound queue -> socket, plus periodic ping
    let writer = tokio::spawn(write_loop(
        ws_tx,
        outbox,
        conn_id.clone(),
        state.ping_interval,
    ));

    // Reader loop: socket -> coordinator
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = state.relay.inbound(conn_id.clone(), text).await {
                    error!("Failed to forward frame from {}: {:#}", conn_id, e);
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame from {}", conn_id);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket error on {}: {}", conn_id, e);
                break;
            }
        }
    }

    if let Err(e) = state.relay.disconnect(conn_id.clone()).await {
        error!("Failed to unregister connection {}: {:#}", conn_id, e);
    }
    writer.abort();

    info!("WebSocket connection closed: {}", conn_id);
}

async fn write_loop(
    mut ws_tx: futures::stream::SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<String>,
    conn_id: ConnectionId,
    ping_interval: std::time::Duration,
) {
    let mut ping = tokio::time::interval(ping_interval);
    ping.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            msg = outbox.recv() => {
                let Some(text) = msg else { break };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    debug!("Failed to send to {}: {}", conn_id, e);
                    break;
                }
            }
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = ws_tx.close().await;
}
