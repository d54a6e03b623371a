//! REST backend wrapper
//!
//! The persistence calls the messaging layer fires. Stateless; every method
//! maps a non-2xx response to a fixed error message for its call site.

use serde::{Deserialize, Serialize};
use std::future::Future;

use tempo_shared::{ChatMessage, UserId};

use crate::error::{ClientError, Result};

/// Outgoing message draft for the persistence call
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    /// Sender
    pub from_user_id: UserId,
    /// Recipient
    pub to_user_id: UserId,
    /// Message body
    pub message: String,
}

/// Minimal user record used for notification display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Backend user id
    pub id: UserId,
    /// Display name
    pub username: String,
}

/// The backend calls the message service depends on. A trait so tests can
/// substitute a rejecting backend.
pub trait MessageApi: Send + Sync + 'static {
    /// Persist a message; reconciliation rides on the outcome
    fn create_message(
        &self,
        message: &NewMessage,
    ) -> impl Future<Output = Result<ChatMessage>> + Send;

    /// Fetch a user for display
    fn fetch_user(&self, id: UserId) -> impl Future<Output = Result<UserSummary>> + Send;
}

/// REST client for the tempo backend
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:3000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url: String = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

impl MessageApi for HttpApi {
    fn create_message(
        &self,
        message: &NewMessage,
    ) -> impl Future<Output = Result<ChatMessage>> + Send {
        let request = self
            .client
            .post(format!("{}/api/messages", self.base_url))
            .json(message)
            .send();
        async move {
            let response = request.await.map_err(|e| ClientError::Api(e.to_string()))?;
            if !response.status().is_success() {
                return Err(ClientError::Api("Failed to create message".to_string()));
            }
            response
                .json::<ChatMessage>()
                .await
                .map_err(|_| ClientError::Api("Invalid create-message response".to_string()))
        }
    }

    fn fetch_user(&self, id: UserId) -> impl Future<Output = Result<UserSummary>> + Send {
        let request = self
            .client
            .get(format!("{}/api/users/{}", self.base_url, id))
            .send();
        async move {
            let response = request.await.map_err(|e| ClientError::Api(e.to_string()))?;
            if !response.status().is_success() {
                return Err(ClientError::Api("Failed to fetch user".to_string()));
            }
            response
                .json::<UserSummary>()
                .await
                .map_err(|_| ClientError::Api("Invalid fetch-user response".to_string()))
        }
    }
}
