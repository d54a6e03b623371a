//! Tempo Wire Protocol
//!
//! Shared types for the tempo real-time relay: the frames clients send,
//! the envelopes the relay fans out, and the identifiers both sides key on.

#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod call;
pub mod channel;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod friend;
pub mod ids;
pub mod message;
pub mod task;

pub use call::{CallNotification, CallSignal};
pub use channel::ChannelName;
pub use envelope::{Control, Envelope, Event, ServerMessage};
pub use error::ProtocolError;
pub use frame::ClientFrame;
pub use friend::{FriendAction, FriendEvent};
pub use ids::{TempId, UserId};
pub use message::{ChatMessage, MessageOutcome};
pub use task::{TaskPayload, TaskUpdate};

/// Version of the relay protocol
pub const PROTOCOL_VERSION: u8 = 1;
