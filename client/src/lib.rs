//! Tempo client library
//!
//! Owns the relay socket, the optimistic messaging layer, and the friend
//! and video call notification services consumed by the UI.

pub mod api;
pub mod calls;
pub mod context;
pub mod error;
pub mod friends;
pub mod messages;
pub mod socket;

pub use api::{HttpApi, MessageApi, NewMessage, UserSummary};
pub use calls::{InviteNotice, JoinInfo, VideoCallService, INVITE_WINDOW};
pub use context::{ClientConfig, ClientContext};
pub use error::ClientError;
pub use friends::FriendService;
pub use messages::{MessageService, MessageStore, MessageToast};
pub use socket::{ConnectionState, ReconnectPolicy, SocketClient};
