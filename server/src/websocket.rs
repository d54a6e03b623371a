//! WebSocket handling: upgrade, per-socket loops, frame dispatch

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tempo_shared::{ChannelName, ClientFrame, Control, Envelope, Event, ProtocolError};

use crate::relay::{ConnId, RelayState};

/// Handle WebSocket upgrade — every upgrade is accepted, the relay performs
/// no auth and no origin check.
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

// ---------------------------------------------------------------------------
// Socket lifecycle
// ---------------------------------------------------------------------------

async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let conn_id = state.register(tx.clone());
    info!(
        "Connection {} opened ({} clients)",
        conn_id,
        state.client_count()
    );

    // Forward outbound frames + send periodic keepalive pings
    let ping_interval_secs = state.config.ws_ping_interval;
    let forward_task = tokio::spawn(async move {
        let mut ping_ticker =
            tokio::time::interval(std::time::Duration::from_secs(ping_interval_secs));
        ping_ticker.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_sender.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_ticker.tick() => {
                    if ws_sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Main receive loop
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_frame(&text, conn_id, &state).await {
                    // Rejected frames get an error reply; the connection
                    // stays open and nothing is fanned out.
                    warn!("Connection {}: rejected frame: {}", conn_id, e);
                    let reply = Control::Error {
                        message: e.to_string(),
                    };
                    if let Ok(frame) = serde_json::to_string(&reply) {
                        let _ = tx.send(frame).await;
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("Connection {}: rejected binary frame", conn_id);
                let reply = Control::Error {
                    message: "Binary frames are not supported".to_string(),
                };
                if let Ok(frame) = serde_json::to_string(&reply) {
                    let _ = tx.send(frame).await;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => { /* axum auto-responds to pings */ }
            Err(e) => {
                debug!("Connection {}: socket error: {}", conn_id, e);
                break;
            }
        }
    }

    state.unregister(conn_id);
    forward_task.abort();
    info!(
        "Connection {} closed ({} clients)",
        conn_id,
        state.client_count()
    );
}

// ---------------------------------------------------------------------------
// Frame dispatch
// ---------------------------------------------------------------------------

async fn handle_frame(
    text: &str,
    conn_id: ConnId,
    state: &Arc<RelayState>,
) -> Result<(), ProtocolError> {
    if text.len() > state.config.max_message_size {
        return Err(ProtocolError::TooLarge {
            size: text.len(),
            limit: state.config.max_message_size,
        });
    }

    let frame: ClientFrame =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    match frame {
        ClientFrame::Subscribe { channel } => {
            debug!("Connection {} subscribed to '{}'", conn_id, channel);
            state.set_channel(conn_id, channel);
        }
        ClientFrame::SendMessage { data } | ClientFrame::DirectMessage { data } => {
            let envelope = Envelope {
                channel: ChannelName::messages(),
                event: Event::MessageSent(data),
            };
            state.broadcast(&envelope).await;
        }
        ClientFrame::Broadcast { channel, data } => {
            state.broadcast(&Envelope { channel, event: data }).await;
        }
        ClientFrame::VideoCallNotification { channel, data } => {
            let envelope = Envelope {
                channel: channel.unwrap_or_else(ChannelName::video_calls),
                event: Event::VideoCallNotification(data),
            };
            state.broadcast(&envelope).await;
        }
    }

    Ok(())
}
