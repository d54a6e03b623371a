//! Client error types

use tempo_shared::TempId;
use thiserror::Error;

/// Errors surfaced by the client services
#[derive(Error, Debug)]
pub enum ClientError {
    /// The relay socket is not currently connected
    #[error("Not connected to the relay")]
    NotConnected,

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    Socket(String),

    /// REST backend call failed
    #[error("API request failed: {0}")]
    Api(String),

    /// Reconciliation referenced a temp id with no pending record
    #[error("Unknown temp id: {0}")]
    UnknownTempId(TempId),

    /// A call response referenced an invite that is not pending
    #[error("No pending invite for call {0}")]
    UnknownInvite(String),

    /// The invite's accept window has passed
    #[error("Invite for call {0} has expired")]
    InviteExpired(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
