//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-synthesized id for a message awaiting persistence.
///
/// Rendered as `temp-<unix millis>-<sequence>`; the sequence component keeps
/// ids distinct when two sends land in the same millisecond. Reconciliation
/// matches on the full id, never on message content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// Build a temp id from a millisecond timestamp and a sequence number.
    pub fn from_parts(millis: i64, seq: u64) -> Self {
        TempId(format!("temp-{}-{}", millis, seq))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
