//! Video call signaling payloads

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// One call signal. `callId`/`meetingId` stay camelCase on the wire to
/// match the HTTP broadcast surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallSignal {
    /// An invitation to join a call
    Invite {
        /// Id of this call attempt
        #[serde(rename = "callId")]
        call_id: String,
        /// Conferencing-provider room id
        #[serde(rename = "meetingId")]
        meeting_id: String,
        /// Join token for the room
        token: String,
        /// Inviter
        from_user: UserId,
        /// Invitee
        to_user: UserId,
    },
    /// The invitee accepted; echoes the join material back to the inviter
    Accept {
        /// Id of the call attempt being accepted
        #[serde(rename = "callId")]
        call_id: String,
        /// Conferencing-provider room id
        #[serde(rename = "meetingId")]
        meeting_id: String,
        /// Join token for the room
        token: String,
        /// Responder
        from_user: UserId,
        /// Original inviter
        to_user: UserId,
    },
    /// The invitee declined
    Decline {
        /// Id of the call attempt being declined
        #[serde(rename = "callId")]
        call_id: String,
        /// Responder
        from_user: UserId,
        /// Original inviter
        to_user: UserId,
    },
    /// A participant ended the call
    End {
        /// Id of the call attempt being ended
        #[serde(rename = "callId")]
        call_id: String,
        /// The participant hanging up
        from_user: UserId,
        /// The other participant
        to_user: UserId,
    },
}

impl CallSignal {
    /// Id of the call attempt this signal belongs to
    pub fn call_id(&self) -> &str {
        match self {
            CallSignal::Invite { call_id, .. }
            | CallSignal::Accept { call_id, .. }
            | CallSignal::Decline { call_id, .. }
            | CallSignal::End { call_id, .. } => call_id,
        }
    }

    /// The user who sent the signal
    pub fn from_user(&self) -> UserId {
        match self {
            CallSignal::Invite { from_user, .. }
            | CallSignal::Accept { from_user, .. }
            | CallSignal::Decline { from_user, .. }
            | CallSignal::End { from_user, .. } => *from_user,
        }
    }

    /// The user the signal is addressed to
    pub fn to_user(&self) -> UserId {
        match self {
            CallSignal::Invite { to_user, .. }
            | CallSignal::Accept { to_user, .. }
            | CallSignal::Decline { to_user, .. }
            | CallSignal::End { to_user, .. } => *to_user,
        }
    }

    /// The signal kind as its wire tag
    pub fn kind(&self) -> &'static str {
        match self {
            CallSignal::Invite { .. } => "invite",
            CallSignal::Accept { .. } => "accept",
            CallSignal::Decline { .. } => "decline",
            CallSignal::End { .. } => "end",
        }
    }
}

/// A call signal plus an optional routing hint.
///
/// `target_user_id` lets a sender address one user explicitly when the
/// signal's own `to_user` is not the delivery target (e.g. group rings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNotification {
    /// The signal itself, flattened into this object on the wire
    #[serde(flatten)]
    pub signal: CallSignal,
    /// Explicit delivery target, when different from `signal.to_user`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<UserId>,
}

impl CallNotification {
    /// The user this notification should be delivered to
    pub fn target(&self) -> UserId {
        self.target_user_id.unwrap_or_else(|| self.signal.to_user())
    }
}
