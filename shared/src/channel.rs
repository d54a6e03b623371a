//! Broadcast channel names

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical broadcast group, identified by name.
///
/// Channels are not stored entities: the relay compares names at broadcast
/// time and nothing validates them, so any string is a usable channel. The
/// constructors below cover the four channels the tempo services use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    /// An arbitrary channel
    pub fn new(name: impl Into<String>) -> Self {
        ChannelName(name.into())
    }

    /// Chat messages and their reconciliation outcomes
    pub fn messages() -> Self {
        ChannelName("message-channel".to_string())
    }

    /// Friend request/accept/decline/remove notifications
    pub fn friends() -> Self {
        ChannelName("friend-notifications".to_string())
    }

    /// Video call invites and responses
    pub fn video_calls() -> Self {
        ChannelName("video-calls".to_string())
    }

    /// Task state changes
    pub fn tasks() -> Self {
        ChannelName("task-updates".to_string())
    }

    /// The channel name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
