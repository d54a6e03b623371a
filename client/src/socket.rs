//! Relay socket client
//!
//! Owns exactly one WebSocket to the relay. Inbound envelopes are dispatched
//! to per-channel callbacks; drops are retried on an explicit backoff
//! schedule whose state the UI can observe.

use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use tempo_shared::{ChannelName, ClientFrame, Control, Event, ServerMessage};

use crate::error::{ClientError, Result};

/// Observable connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no retry scheduled
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// The socket is open
    Connected,
    /// Waiting to retry after the given failure count
    Backoff(u32),
    /// Retry budget exhausted; reconnection requires a new client
    GaveUp,
}

/// Reconnect schedule: a fixed base delay multiplied by the failure count,
/// with a hard attempt cap.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Delay multiplier
    pub base_delay: Duration,
    /// Failures tolerated before giving up
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once
    /// the attempt budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay * attempt)
    }
}

type Callback = Arc<dyn Fn(Event) + Send + Sync>;
type Registry = RwLock<HashMap<ChannelName, Vec<Callback>>>;

/// WebSocket client for the relay
pub struct SocketClient {
    outbound: mpsc::Sender<String>,
    state_rx: watch::Receiver<ConnectionState>,
    registry: Arc<Registry>,
    /// Channel to replay as a subscribe frame after every (re)connect
    pending_channel: Arc<RwLock<Option<ChannelName>>>,
    driver: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SocketClient {
    /// Open the connection and start the reconnect driver.
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let url = normalize_url(url.into());
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let registry: Arc<Registry> = Arc::new(RwLock::new(HashMap::new()));
        let pending_channel = Arc::new(RwLock::new(None));

        let driver = tokio::spawn(drive(
            url,
            policy,
            registry.clone(),
            outbound_rx,
            state_tx,
            pending_channel.clone(),
        ));

        Self {
            outbound: outbound_tx,
            state_rx,
            registry,
            pending_channel,
            driver: Mutex::new(Some(driver)),
        }
    }

    /// Last-known connection state
    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A receiver the UI can watch for state transitions
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Send a frame to the relay. Fails when the socket is down; nothing is
    /// queued across disconnects.
    pub async fn send(&self, frame: &ClientFrame) -> Result<()> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let text = serde_json::to_string(frame).map_err(|e| ClientError::Socket(e.to_string()))?;
        self.outbound
            .send(text)
            .await
            .map_err(|_| ClientError::NotConnected)
    }

    /// Register a callback for a channel without requesting server-side
    /// filtering. An untagged connection receives every channel, so this is
    /// how the multi-service context listens.
    pub async fn on_channel<F>(&self, channel: ChannelName, callback: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write().await;
        registry.entry(channel).or_default().push(Arc::new(callback));
    }

    /// Register a callback and tag the connection with the channel so the
    /// relay filters server-side. The tag is last-write-wins on the relay.
    /// When the socket is down the frame is not lost: the channel becomes
    /// the pending subscription and is replayed on (re)connect.
    pub async fn subscribe_to_channel<F>(&self, channel: ChannelName, callback: F) -> Result<()>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.on_channel(channel.clone(), callback).await;
        *self.pending_channel.write().await = Some(channel.clone());
        if self.connection_state() == ConnectionState::Connected {
            self.send(&ClientFrame::Subscribe { channel }).await?;
        }
        Ok(())
    }

    /// Stop the driver. The watch channel keeps reporting the last state.
    pub async fn shutdown(&self) {
        if let Some(driver) = self.driver.lock().await.take() {
            driver.abort();
            info!("Socket client shut down");
        }
    }
}

// ---------------------------------------------------------------------------
// Connection driver
// ---------------------------------------------------------------------------

async fn drive(
    url: String,
    policy: ReconnectPolicy,
    registry: Arc<Registry>,
    mut outbound: mpsc::Receiver<String>,
    state_tx: watch::Sender<ConnectionState>,
    pending_channel: Arc<RwLock<Option<ChannelName>>>,
) {
    let mut attempt: u32 = 0;
    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                info!("Connected to relay at {}", url);
                attempt = 0;
                let _ = state_tx.send(ConnectionState::Connected);
                let (mut write, mut read) = stream.split();

                // Replay the last requested channel so server-side filtering
                // survives reconnects.
                let replay = pending_channel.read().await.clone();
                if let Some(channel) = replay {
                    match serde_json::to_string(&ClientFrame::Subscribe { channel }) {
                        Ok(text) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                warn!("Failed to replay channel subscription");
                            }
                        }
                        Err(e) => error!("Failed to serialize subscribe frame: {}", e),
                    }
                }

                // Session loop: pump outbound frames, dispatch inbound ones.
                loop {
                    tokio::select! {
                        frame = outbound.recv() => match frame {
                            Some(text) => {
                                if write.send(Message::Text(text)).await.is_err() {
                                    warn!("Relay write failed, reconnecting");
                                    break;
                                }
                            }
                            None => {
                                // Client handle dropped: close and stop.
                                let _ = write.send(Message::Close(None)).await;
                                let _ = state_tx.send(ConnectionState::Disconnected);
                                return;
                            }
                        },
                        msg = read.next() => match msg {
                            Some(Ok(Message::Text(text))) => dispatch(&registry, &text).await,
                            Some(Ok(Message::Close(_))) => {
                                info!("Relay closed the connection");
                                break;
                            }
                            Some(Ok(_)) => { /* pings answered by tungstenite */ }
                            Some(Err(e)) => {
                                warn!("WebSocket error: {}", e);
                                break;
                            }
                            None => {
                                info!("Relay stream ended");
                                break;
                            }
                        },
                    }
                }
            }
            Err(e) => warn!("Connecting to {} failed: {}", url, e),
        }

        attempt += 1;
        match policy.delay_for(attempt) {
            Some(delay) => {
                let _ = state_tx.send(ConnectionState::Backoff(attempt));
                debug!("Reconnect attempt {} in {:?}", attempt, delay);
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(
                    "Giving up after {} failed reconnect attempts",
                    policy.max_attempts
                );
                let _ = state_tx.send(ConnectionState::GaveUp);
                return;
            }
        }
    }
}

/// Parse one inbound frame and invoke the callbacks registered for its
/// channel. Parse failures and relay rejections are logged, never fatal.
async fn dispatch(registry: &Registry, text: &str) {
    let msg: ServerMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Unparseable frame from relay: {}", e);
            return;
        }
    };

    match msg {
        ServerMessage::Envelope(envelope) => {
            let registry = registry.read().await;
            if let Some(callbacks) = registry.get(&envelope.channel) {
                for callback in callbacks {
                    callback(envelope.event.clone());
                }
            }
        }
        ServerMessage::Control(Control::Error { message }) => {
            warn!("Relay rejected a frame: {}", message);
        }
    }
}

/// Normalize a relay address into a WebSocket URL ending in `/ws`.
fn normalize_url(input: String) -> String {
    let url = if input.starts_with("ws://") || input.starts_with("wss://") {
        input
    } else if let Some(rest) = input.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = input.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if input.starts_with("localhost") || input.starts_with("127.0.0.1") {
        // Plain ws:// for local development
        format!("ws://{}", input)
    } else {
        format!("wss://{}", input)
    };

    if url.ends_with("/ws") {
        url
    } else {
        format!("{}/ws", url)
    }
}
