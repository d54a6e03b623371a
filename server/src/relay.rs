//! Connection registry and broadcast fan-out

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error};

use tempo_shared::{ChannelName, Envelope};

use crate::config::RelayConfig;

/// Identifies one connection for the lifetime of the process
pub type ConnId = u64;

/// Per-connection handle: the outbound queue plus the last-subscribed channel
pub struct ClientHandle {
    /// Sender feeding the connection's forward task
    pub tx: mpsc::Sender<String>,
    /// None until the first `subscribe` frame. An untagged connection
    /// receives every broadcast (wildcard).
    pub channel: Option<ChannelName>,
}

// ---------------------------------------------------------------------------
// Relay state
// ---------------------------------------------------------------------------

/// Relay state shared across connections
pub struct RelayState {
    /// Relay configuration
    pub config: RelayConfig,
    /// Map of connection id → handle
    pub connections: dashmap::DashMap<ConnId, ClientHandle>,
    next_id: AtomicU64,
}

impl RelayState {
    /// Create relay state with an empty registry
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            connections: dashmap::DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a freshly upgraded connection, untagged
    pub fn register(&self, tx: mpsc::Sender<String>) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, ClientHandle { tx, channel: None });
        id
    }

    /// Drop a connection from the registry (close or socket error)
    pub fn unregister(&self, id: ConnId) {
        self.connections.remove(&id);
    }

    /// Set the connection's channel tag. Last write wins; no ack is sent.
    pub fn set_channel(&self, id: ConnId, channel: ChannelName) {
        if let Some(mut entry) = self.connections.get_mut(&id) {
            entry.value_mut().channel = Some(channel);
        }
    }

    /// Number of open connections
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }

    /// Fan an envelope out to every connection tagged with its channel plus
    /// every untagged connection. Returns the number of deliveries.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        let frame = match serde_json::to_string(envelope) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize envelope: {}", e);
                return 0;
            }
        };

        // Snapshot the matching senders first so no registry guard is held
        // across an await.
        let targets: Vec<mpsc::Sender<String>> = self
            .connections
            .iter()
            .filter(|entry| match &entry.value().channel {
                Some(channel) => *channel == envelope.channel,
                None => true,
            })
            .map(|entry| entry.value().tx.clone())
            .collect();

        let mut delivered = 0;
        for tx in targets {
            if tx.send(frame.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        debug!(
            "{} on '{}' delivered to {} of {} clients",
            envelope.event.name(),
            envelope.channel,
            delivered,
            self.client_count()
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_shared::{Event, TaskUpdate};

    fn task_envelope(channel: ChannelName) -> Envelope {
        Envelope {
            channel,
            event: Event::TaskUpdated(TaskUpdate {
                task: serde_json::from_value(serde_json::json!({"id": 1, "status": "completed"}))
                    .expect("task"),
            }),
        }
    }

    fn register_client(state: &RelayState) -> (ConnId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (state.register(tx), rx)
    }

    #[tokio::test]
    async fn test_broadcast_matches_tagged_and_untagged() {
        let state = RelayState::new(RelayConfig::default());
        let (a, mut rx_a) = register_client(&state);
        let (b, mut rx_b) = register_client(&state);
        let (_c, mut rx_c) = register_client(&state);
        let (d, mut rx_d) = register_client(&state);

        state.set_channel(a, ChannelName::tasks());
        state.set_channel(b, ChannelName::tasks());
        state.set_channel(d, ChannelName::messages());
        // c stays untagged and must receive everything

        let delivered = state.broadcast(&task_envelope(ChannelName::tasks())).await;
        assert_eq!(delivered, 3);

        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            let frame = rx.try_recv().expect("expected one envelope");
            assert!(frame.contains("TaskUpdated"));
            assert!(rx.try_recv().is_err(), "expected exactly one copy");
        }
        assert!(rx_d.try_recv().is_err(), "other channel must receive none");
    }

    #[tokio::test]
    async fn test_subscribe_last_write_wins() {
        let state = RelayState::new(RelayConfig::default());
        let (id, mut rx) = register_client(&state);

        state.set_channel(id, ChannelName::messages());
        state.set_channel(id, ChannelName::tasks());

        let tag = state
            .connections
            .get(&id)
            .and_then(|entry| entry.value().channel.clone());
        assert_eq!(tag, Some(ChannelName::tasks()));

        state.broadcast(&task_envelope(ChannelName::messages())).await;
        assert!(rx.try_recv().is_err());

        let delivered = state.broadcast(&task_envelope(ChannelName::tasks())).await;
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let state = RelayState::new(RelayConfig::default());
        let delivered = state.broadcast(&task_envelope(ChannelName::tasks())).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let state = RelayState::new(RelayConfig::default());
        let (id, mut rx) = register_client(&state);
        assert_eq!(state.client_count(), 1);

        state.unregister(id);
        assert_eq!(state.client_count(), 0);

        let delivered = state.broadcast(&task_envelope(ChannelName::tasks())).await;
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }
}
