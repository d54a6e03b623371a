//! Video call notification dispatch
//!
//! Invites are held in a pending table stamped at receipt. Accepting inside
//! the invite window returns the join material and notifies the inviter; an
//! invite that outlives its window can no longer be accepted through this
//! path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use tempo_shared::{CallNotification, CallSignal, ChannelName, ClientFrame, Event, UserId};

use crate::error::{ClientError, Result};
use crate::socket::SocketClient;

/// How long an invite stays acceptable (the toast display window)
pub const INVITE_WINDOW: Duration = Duration::from_secs(30);

/// What the UI needs to join an accepted call
#[derive(Debug, Clone, PartialEq)]
pub struct JoinInfo {
    /// Id of the accepted call attempt
    pub call_id: String,
    /// Conferencing-provider room id
    pub meeting_id: String,
    /// Join token for the room
    pub token: String,
}

/// An invite surfaced to the UI
#[derive(Debug, Clone, PartialEq)]
pub struct InviteNotice {
    /// Id of the call attempt
    pub call_id: String,
    /// Conferencing-provider room id
    pub meeting_id: String,
    /// Join token for the room
    pub token: String,
    /// The inviter
    pub from_user: UserId,
}

struct PendingInvite {
    meeting_id: String,
    token: String,
    from_user: UserId,
    received_at: Instant,
}

type InviteHandler = Arc<dyn Fn(InviteNotice) + Send + Sync>;
type ResponseHandler = Arc<dyn Fn(CallSignal) + Send + Sync>;

/// Dispatches call signals addressed to the current user
pub struct VideoCallService {
    socket: Arc<SocketClient>,
    current_user: UserId,
    invite_window: Duration,
    pending: RwLock<HashMap<String, PendingInvite>>,
    invite_handlers: RwLock<Vec<InviteHandler>>,
    response_handlers: RwLock<Vec<ResponseHandler>>,
}

impl VideoCallService {
    /// Create the service and register it on the video call channel.
    pub async fn attach(socket: Arc<SocketClient>, current_user: UserId) -> Arc<Self> {
        Self::attach_with_window(socket, current_user, INVITE_WINDOW).await
    }

    /// Like [`attach`](Self::attach) with an explicit invite window
    pub async fn attach_with_window(
        socket: Arc<SocketClient>,
        current_user: UserId,
        invite_window: Duration,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            socket,
            current_user,
            invite_window,
            pending: RwLock::new(HashMap::new()),
            invite_handlers: RwLock::new(Vec::new()),
            response_handlers: RwLock::new(Vec::new()),
        });

        let weak = Arc::downgrade(&service);
        service
            .socket
            .on_channel(ChannelName::video_calls(), move |event| {
                if let Some(service) = weak.upgrade() {
                    tokio::spawn(async move { service.handle_event(event).await });
                }
            })
            .await;

        service
    }

    /// Register a handler for incoming invites
    pub async fn on_invite<F>(&self, handler: F)
    where
        F: Fn(InviteNotice) + Send + Sync + 'static,
    {
        self.invite_handlers.write().await.push(Arc::new(handler));
    }

    /// Register a handler for responses to calls we initiated
    pub async fn on_response<F>(&self, handler: F)
    where
        F: Fn(CallSignal) + Send + Sync + 'static,
    {
        self.response_handlers.write().await.push(Arc::new(handler));
    }

    /// Invite `to_user` to the given room
    pub async fn invite(
        &self,
        to_user: UserId,
        call_id: impl Into<String>,
        meeting_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<()> {
        let signal = CallSignal::Invite {
            call_id: call_id.into(),
            meeting_id: meeting_id.into(),
            token: token.into(),
            from_user: self.current_user,
            to_user,
        };
        self.broadcast(signal, Some(to_user)).await
    }

    /// Accept a pending invite inside its window. Returns the join material
    /// and notifies the inviter.
    pub async fn accept(&self, call_id: &str) -> Result<JoinInfo> {
        let invite = self
            .pending
            .write()
            .await
            .remove(call_id)
            .ok_or_else(|| ClientError::UnknownInvite(call_id.to_string()))?;
        if invite.received_at.elapsed() >= self.invite_window {
            return Err(ClientError::InviteExpired(call_id.to_string()));
        }

        let response = CallSignal::Accept {
            call_id: call_id.to_string(),
            meeting_id: invite.meeting_id.clone(),
            token: invite.token.clone(),
            from_user: self.current_user,
            to_user: invite.from_user,
        };
        // Best-effort: the join material is returned even when the response
        // cannot be delivered right now.
        if let Err(e) = self.broadcast(response, Some(invite.from_user)).await {
            debug!("Accept response broadcast failed: {}", e);
        }

        Ok(JoinInfo {
            call_id: call_id.to_string(),
            meeting_id: invite.meeting_id,
            token: invite.token,
        })
    }

    /// Decline a pending invite and notify the inviter
    pub async fn decline(&self, call_id: &str) -> Result<()> {
        let invite = self
            .pending
            .write()
            .await
            .remove(call_id)
            .ok_or_else(|| ClientError::UnknownInvite(call_id.to_string()))?;
        let response = CallSignal::Decline {
            call_id: call_id.to_string(),
            from_user: self.current_user,
            to_user: invite.from_user,
        };
        self.broadcast(response, Some(invite.from_user)).await
    }

    /// Handle one event from the video call channel. Self-sent signals and
    /// signals targeting other users are dropped.
    pub async fn handle_event(&self, event: Event) {
        let notification = match event {
            Event::VideoCallNotification(notification) => notification,
            other => {
                debug!("Ignoring {} on the video call channel", other.name());
                return;
            }
        };
        if notification.signal.from_user() == self.current_user {
            return;
        }
        if notification.target() != self.current_user {
            return;
        }

        match notification.signal {
            CallSignal::Invite {
                call_id,
                meeting_id,
                token,
                from_user,
                ..
            } => {
                self.pending.write().await.insert(
                    call_id.clone(),
                    PendingInvite {
                        meeting_id: meeting_id.clone(),
                        token: token.clone(),
                        from_user,
                        received_at: Instant::now(),
                    },
                );
                let notice = InviteNotice {
                    call_id,
                    meeting_id,
                    token,
                    from_user,
                };
                for handler in self.invite_handlers.read().await.iter() {
                    handler(notice.clone());
                }
            }
            response => {
                // A decline/end for an invite we hold cancels it; accept
                // responses never match a pending entry on the inviter side.
                self.pending.write().await.remove(response.call_id());
                for handler in self.response_handlers.read().await.iter() {
                    handler(response.clone());
                }
            }
        }
    }

    async fn broadcast(&self, signal: CallSignal, target: Option<UserId>) -> Result<()> {
        let frame = ClientFrame::VideoCallNotification {
            channel: None,
            data: CallNotification {
                signal,
                target_user_id: target,
            },
        };
        self.socket.send(&frame).await
    }
}
