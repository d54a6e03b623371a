//! Relay configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum inbound frame size in bytes
    pub max_message_size: usize,
    /// WebSocket ping interval in seconds
    pub ws_ping_interval: u64,
    /// Comma-separated list of allowed CORS origins (empty = permissive)
    pub cors_origins: Option<String>,
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = RelayConfig {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,
            max_message_size: env::var("RELAY_MAX_MESSAGE_SIZE")
                .unwrap_or_else(|_| "65536".to_string()) // 64KB
                .parse()
                .context("Invalid RELAY_MAX_MESSAGE_SIZE")?,
            ws_ping_interval: env::var("RELAY_WS_PING_INTERVAL")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid RELAY_WS_PING_INTERVAL")?,
            cors_origins: env::var("RELAY_CORS_ORIGINS").ok(),
        };

        Ok(config)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_message_size: 65536,
            ws_ping_interval: 30,
            cors_origins: None,
        }
    }
}
