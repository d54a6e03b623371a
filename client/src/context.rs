//! Client context: the dependency-injection root
//!
//! One context is constructed at app start and passed by reference to
//! consumers; nothing here lives in module-level globals.

use std::env;
use std::sync::Arc;
use tracing::info;

use tempo_shared::{ChannelName, Event, TaskUpdate, UserId};

use crate::api::HttpApi;
use crate::calls::VideoCallService;
use crate::error::{ClientError, Result};
use crate::friends::FriendService;
use crate::messages::MessageService;
use crate::socket::{ReconnectPolicy, SocketClient};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay WebSocket URL
    pub relay_url: String,
    /// REST backend base URL
    pub api_base_url: String,
    /// The signed-in user
    pub current_user: UserId,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let current_user = env::var("TEMPO_USER_ID")
            .map_err(|_| ClientError::Config("TEMPO_USER_ID is not set".to_string()))?
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| ClientError::Config("Invalid TEMPO_USER_ID".to_string()))?;

        Ok(ClientConfig {
            relay_url: env::var("TEMPO_RELAY_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8080/ws".to_string()),
            api_base_url: env::var("TEMPO_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string()),
            current_user,
        })
    }
}

/// Everything a consumer needs, constructed once at app start.
///
/// The services register plain channel callbacks rather than subscribe
/// frames: the connection stays untagged, so the relay delivers every
/// channel and each service filters client-side. `subscribe_to_channel` on
/// the socket remains available for single-channel consumers.
pub struct ClientContext {
    /// The relay connection
    pub socket: Arc<SocketClient>,
    /// Optimistic messaging
    pub messages: Arc<MessageService<HttpApi>>,
    /// Friend notifications
    pub friends: Arc<FriendService>,
    /// Video call notifications
    pub calls: Arc<VideoCallService>,
}

impl ClientContext {
    /// Connect and wire every service
    pub async fn init(config: ClientConfig) -> Result<Self> {
        let socket = Arc::new(SocketClient::connect(
            config.relay_url.clone(),
            ReconnectPolicy::default(),
        ));
        let api = Arc::new(HttpApi::new(config.api_base_url.clone()));

        let messages = MessageService::attach(socket.clone(), api, config.current_user).await;
        let friends = FriendService::attach(socket.clone(), config.current_user).await;
        let calls = VideoCallService::attach(socket.clone(), config.current_user).await;

        info!("Client context initialized for user {}", config.current_user);
        Ok(ClientContext {
            socket,
            messages,
            friends,
            calls,
        })
    }

    /// Register a callback for task updates
    pub async fn on_task_updated<F>(&self, callback: F)
    where
        F: Fn(TaskUpdate) + Send + Sync + 'static,
    {
        self.socket
            .on_channel(ChannelName::tasks(), move |event| {
                if let Event::TaskUpdated(update) = event {
                    callback(update);
                }
            })
            .await;
    }

    /// Tear the context down: stops the socket driver.
    pub async fn dispose(self) {
        self.socket.shutdown().await;
    }
}
