//! Client-to-server frames

use serde::{Deserialize, Serialize};

use crate::call::CallNotification;
use crate::channel::ChannelName;
use crate::envelope::Event;
use crate::message::ChatMessage;

/// The closed set of frames a client may send.
///
/// Unknown `type` tags fail to parse and are answered with a
/// [`Control::Error`](crate::envelope::Control) frame by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Tag this connection with a channel; last write wins, no ack
    Subscribe {
        /// The channel to filter to
        channel: ChannelName,
    },
    /// Publish a chat message on the message channel
    SendMessage {
        /// The message to fan out
        data: ChatMessage,
    },
    /// Publish a direct chat message; relayed identically to `send_message`,
    /// the addressing lives in the payload
    DirectMessage {
        /// The message to fan out
        data: ChatMessage,
    },
    /// Publish an arbitrary event on an explicit channel
    Broadcast {
        /// The channel to publish on
        channel: ChannelName,
        /// The event to wrap and fan out
        data: Event,
    },
    /// Publish a call signal, defaulting to the video-calls channel
    VideoCallNotification {
        /// Override channel, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<ChannelName>,
        /// The signal to fan out
        data: CallNotification,
    },
}
