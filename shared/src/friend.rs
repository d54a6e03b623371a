//! Friend notification payloads

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// What happened to a friendship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendAction {
    /// A friend request was sent
    Request,
    /// A pending request was accepted
    Accept,
    /// A pending request was declined
    Decline,
    /// An existing friendship was removed
    Remove,
}

/// One friend notification.
///
/// `user_id` is the acting user, `friend_id` the user the action targets.
/// The `*_data` fields are opaque backend resources forwarded as-is for the
/// receiving UI; the relay never inspects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEvent {
    /// The friendship action taken
    pub action: FriendAction,
    /// The user who acted
    pub user_id: UserId,
    /// The user the action targets
    pub friend_id: UserId,
    /// Backend friendship record, if the sender attached one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendship_data: Option<serde_json::Value>,
    /// Backend record for the acting user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<serde_json::Value>,
    /// Backend record for the target user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_data: Option<serde_json::Value>,
}
