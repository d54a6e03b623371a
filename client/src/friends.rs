//! Friend notification dispatch

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use tempo_shared::{ChannelName, ClientFrame, Event, FriendAction, FriendEvent, UserId};

use crate::error::Result;
use crate::socket::SocketClient;

type Handler = Arc<dyn Fn(FriendEvent) + Send + Sync>;

/// Dispatches friend notifications addressed to the current user
pub struct FriendService {
    socket: Arc<SocketClient>,
    current_user: UserId,
    by_action: RwLock<HashMap<FriendAction, Vec<Handler>>>,
    any: RwLock<Vec<Handler>>,
}

impl FriendService {
    /// Create the service and register it on the friend channel.
    pub async fn attach(socket: Arc<SocketClient>, current_user: UserId) -> Arc<Self> {
        let service = Arc::new(Self {
            socket,
            current_user,
            by_action: RwLock::new(HashMap::new()),
            any: RwLock::new(Vec::new()),
        });

        let weak = Arc::downgrade(&service);
        service
            .socket
            .on_channel(ChannelName::friends(), move |event| {
                if let Some(service) = weak.upgrade() {
                    tokio::spawn(async move { service.handle_event(event).await });
                }
            })
            .await;

        service
    }

    /// Register a handler for one friendship action
    pub async fn on_action<F>(&self, action: FriendAction, handler: F)
    where
        F: Fn(FriendEvent) + Send + Sync + 'static,
    {
        self.by_action
            .write()
            .await
            .entry(action)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Register a handler for every friendship action
    pub async fn on_event<F>(&self, handler: F)
    where
        F: Fn(FriendEvent) + Send + Sync + 'static,
    {
        self.any.write().await.push(Arc::new(handler));
    }

    /// Broadcast a friendship action taken by the current user
    pub async fn send(
        &self,
        action: FriendAction,
        friend_id: UserId,
        friendship_data: Option<serde_json::Value>,
    ) -> Result<()> {
        let event = FriendEvent {
            action,
            user_id: self.current_user,
            friend_id,
            friendship_data,
            user_data: None,
            friend_data: None,
        };
        self.socket
            .send(&ClientFrame::Broadcast {
                channel: ChannelName::friends(),
                data: Event::FriendNotification(event),
            })
            .await
    }

    /// Handle one event from the friend channel. Self-sent events are
    /// dropped; only events addressed to the current user surface.
    pub async fn handle_event(&self, event: Event) {
        let notification = match event {
            Event::FriendNotification(notification) => notification,
            other => {
                debug!("Ignoring {} on the friend channel", other.name());
                return;
            }
        };
        if notification.user_id == self.current_user {
            return;
        }
        if notification.friend_id != self.current_user {
            return;
        }

        for handler in self.any.read().await.iter() {
            handler(notification.clone());
        }
        if let Some(handlers) = self.by_action.read().await.get(&notification.action) {
            for handler in handlers {
                handler(notification.clone());
            }
        }
    }
}
