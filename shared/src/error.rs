//! Error types for protocol handling

use thiserror::Error;

/// Errors that can occur while parsing or validating wire frames
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match any known shape
    #[error("Malformed frame: {0}")]
    Malformed(String),

    /// Frame exceeds the configured size limit
    #[error("Frame too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Observed frame size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },
}

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
