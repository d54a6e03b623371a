//! Chat message payloads

use serde::{Deserialize, Serialize};

use crate::ids::{TempId, UserId};

/// One direct message between two users.
///
/// A message starts life client-side with only a `temp_id` and
/// `is_temporary` set; once the backend persists it, the permanent `id`
/// replaces the temporary record (matched by `temp_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Backend-assigned id, present once persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Client-synthesized id, present while the message awaits persistence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<TempId>,
    /// Sender
    pub from_user_id: UserId,
    /// Recipient
    pub to_user_id: UserId,
    /// Message body
    pub message: String,
    /// Creation time, unix milliseconds
    pub created_at: i64,
    /// True until the persistence round-trip confirms the message
    #[serde(default)]
    pub is_temporary: bool,
}

/// Outcome of the persistence call behind an optimistic send.
///
/// Broadcast on the message channel so every client holding the temporary
/// record can reconcile it: swap in the permanent message, or drop it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Persistence succeeded; `message` carries the permanent id
    MessageUpdated {
        /// The temporary id to replace
        temp_id: TempId,
        /// The persisted message
        message: ChatMessage,
    },
    /// Persistence failed; the temporary record must be removed
    MessageFailed {
        /// The temporary id to drop
        temp_id: TempId,
    },
}
