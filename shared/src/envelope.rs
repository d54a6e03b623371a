//! Server-to-client envelopes

use serde::{Deserialize, Serialize};

use crate::call::CallNotification;
use crate::channel::ChannelName;
use crate::friend::FriendEvent;
use crate::message::{ChatMessage, MessageOutcome};
use crate::task::TaskUpdate;

/// The closed set of events the relay fans out, one variant per event name.
///
/// On the wire this is the `event`/`data` pair of an envelope. Anything
/// outside this set is rejected at the relay boundary rather than forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    /// A new chat message (optimistic or persisted)
    MessageSent(ChatMessage),
    /// Reconciliation outcome for an optimistic send
    MessageUpdate(MessageOutcome),
    /// A friendship change
    FriendNotification(FriendEvent),
    /// A call invite or response
    VideoCallNotification(CallNotification),
    /// A task state change
    TaskUpdated(TaskUpdate),
}

impl Event {
    /// The event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Event::MessageSent(_) => "MessageSent",
            Event::MessageUpdate(_) => "MessageUpdate",
            Event::FriendNotification(_) => "FriendNotification",
            Event::VideoCallNotification(_) => "VideoCallNotification",
            Event::TaskUpdated(_) => "TaskUpdated",
        }
    }
}

/// The transport wrapper the relay sends: `{event, channel, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Channel the event was broadcast on
    pub channel: ChannelName,
    /// The event, contributing the `event` and `data` fields
    #[serde(flatten)]
    pub event: Event,
}

/// Non-envelope frames the relay sends back to one connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    /// The previous frame was rejected; the connection stays open
    Error {
        /// Why the frame was rejected
        message: String,
    },
}

/// Anything a client can receive from the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// A broadcast envelope
    Envelope(Envelope),
    /// A per-connection control frame
    Control(Control),
}
