//! Optimistic messaging with temp-id reconciliation
//!
//! Sending feels instantaneous: a temporary record is inserted and broadcast
//! immediately, the real persistence call runs out-of-band, and the outcome
//! (`message_updated` / `message_failed`) reconciles every copy by temp id.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use tempo_shared::{ChannelName, ChatMessage, ClientFrame, Event, MessageOutcome, TempId, UserId};

use crate::api::{MessageApi, NewMessage, UserSummary};
use crate::error::{ClientError, Result};
use crate::socket::SocketClient;

/// Current unix time in milliseconds
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

struct TempIdGenerator {
    seq: AtomicU64,
}

impl TempIdGenerator {
    fn next(&self) -> TempId {
        TempId::from_parts(now_millis(), self.seq.fetch_add(1, Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// Message store
// ---------------------------------------------------------------------------

/// Conversation state: messages grouped by the other participant, plus the
/// arena of optimistic sends awaiting reconciliation.
#[derive(Default)]
pub struct MessageStore {
    conversations: HashMap<UserId, Vec<ChatMessage>>,
    pending: HashMap<TempId, UserId>,
}

impl MessageStore {
    /// Append a message to a conversation
    pub fn insert(&mut self, peer: UserId, message: ChatMessage) {
        self.conversations.entry(peer).or_default().push(message);
    }

    /// Append an optimistic message and track its temp id
    pub fn insert_temp(&mut self, peer: UserId, message: ChatMessage) {
        if let Some(temp_id) = message.temp_id.clone() {
            self.pending.insert(temp_id, peer);
        }
        self.insert(peer, message);
    }

    /// Whether a temp id is still awaiting reconciliation
    pub fn is_pending(&self, temp_id: &TempId) -> bool {
        self.pending.contains_key(temp_id)
    }

    /// Replace the temporary record in place with the persisted message.
    /// The match is by temp id, never by content.
    pub fn confirm(&mut self, temp_id: &TempId, mut message: ChatMessage) -> Result<()> {
        let peer = self
            .pending
            .remove(temp_id)
            .ok_or_else(|| ClientError::UnknownTempId(temp_id.clone()))?;
        let slot = self
            .conversations
            .get_mut(&peer)
            .and_then(|list| list.iter_mut().find(|m| m.temp_id.as_ref() == Some(temp_id)))
            .ok_or_else(|| ClientError::UnknownTempId(temp_id.clone()))?;
        message.is_temporary = false;
        *slot = message;
        Ok(())
    }

    /// Remove the temporary record after a failed persistence call
    pub fn fail(&mut self, temp_id: &TempId) -> Result<ChatMessage> {
        let peer = self
            .pending
            .remove(temp_id)
            .ok_or_else(|| ClientError::UnknownTempId(temp_id.clone()))?;
        let list = self
            .conversations
            .get_mut(&peer)
            .ok_or_else(|| ClientError::UnknownTempId(temp_id.clone()))?;
        let index = list
            .iter()
            .position(|m| m.temp_id.as_ref() == Some(temp_id))
            .ok_or_else(|| ClientError::UnknownTempId(temp_id.clone()))?;
        Ok(list.remove(index))
    }

    /// Snapshot of one conversation
    pub fn conversation(&self, peer: UserId) -> Vec<ChatMessage> {
        self.conversations.get(&peer).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Message service
// ---------------------------------------------------------------------------

/// What the UI should surface for a message event
#[derive(Debug, Clone)]
pub enum MessageToast {
    /// A message arrived while its conversation was closed
    Received {
        /// Resolved sender
        from: UserSummary,
        /// Message body
        preview: String,
    },
    /// An optimistic send failed and was rolled back
    SendFailed {
        /// The rolled-back temp id
        temp_id: TempId,
    },
}

type ToastCallback = Arc<dyn Fn(MessageToast) + Send + Sync>;

/// Optimistic messaging layered on the relay socket
pub struct MessageService<A> {
    socket: Arc<SocketClient>,
    api: Arc<A>,
    current_user: UserId,
    store: Arc<Mutex<MessageStore>>,
    /// Peers whose chat window is currently open (toasts suppressed)
    open_chats: RwLock<HashSet<UserId>>,
    user_cache: RwLock<HashMap<UserId, UserSummary>>,
    toasts: Arc<RwLock<Vec<ToastCallback>>>,
    temp_ids: TempIdGenerator,
}

impl<A: MessageApi> MessageService<A> {
    /// Create the service and register it on the message channel.
    pub async fn attach(socket: Arc<SocketClient>, api: Arc<A>, current_user: UserId) -> Arc<Self> {
        let service = Arc::new(Self {
            socket,
            api,
            current_user,
            store: Arc::new(Mutex::new(MessageStore::default())),
            open_chats: RwLock::new(HashSet::new()),
            user_cache: RwLock::new(HashMap::new()),
            toasts: Arc::new(RwLock::new(Vec::new())),
            temp_ids: TempIdGenerator {
                seq: AtomicU64::new(0),
            },
        });

        let weak = Arc::downgrade(&service);
        service
            .socket
            .on_channel(ChannelName::messages(), move |event| {
                if let Some(service) = weak.upgrade() {
                    tokio::spawn(async move { service.handle_event(event).await });
                }
            })
            .await;

        service
    }

    /// Register a toast callback
    pub async fn on_toast<F>(&self, callback: F)
    where
        F: Fn(MessageToast) + Send + Sync + 'static,
    {
        self.toasts.write().await.push(Arc::new(callback));
    }

    /// Mark the conversation with `peer` open: its messages stop toasting
    pub async fn set_chat_open(&self, peer: UserId) {
        self.open_chats.write().await.insert(peer);
    }

    /// Mark the conversation with `peer` closed
    pub async fn set_chat_closed(&self, peer: UserId) {
        self.open_chats.write().await.remove(&peer);
    }

    /// Snapshot of the conversation with `peer`
    pub async fn conversation(&self, peer: UserId) -> Vec<ChatMessage> {
        self.store.lock().await.conversation(peer)
    }

    /// Whether a temp id is still awaiting reconciliation
    pub async fn has_pending(&self, temp_id: &TempId) -> bool {
        self.store.lock().await.is_pending(temp_id)
    }

    /// Send a message optimistically. The temporary record is inserted and
    /// broadcast immediately; persistence runs out-of-band and reconciles
    /// via [`MessageOutcome`]. Failure is terminal per message — no retry.
    pub async fn send_message(&self, outgoing: NewMessage) -> TempId {
        let temp_id = self.temp_ids.next();
        let message = ChatMessage {
            id: None,
            temp_id: Some(temp_id.clone()),
            from_user_id: outgoing.from_user_id,
            to_user_id: outgoing.to_user_id,
            message: outgoing.message.clone(),
            created_at: now_millis(),
            is_temporary: true,
        };

        self.store
            .lock()
            .await
            .insert_temp(outgoing.to_user_id, message.clone());

        // Local echo via the relay: other clients see the message before
        // persistence settles.
        if let Err(e) = self
            .socket
            .send(&ClientFrame::SendMessage { data: message })
            .await
        {
            warn!("Optimistic broadcast failed: {}", e);
        }

        let api = self.api.clone();
        let socket = self.socket.clone();
        let store = self.store.clone();
        let toasts = self.toasts.clone();
        let tid = temp_id.clone();
        tokio::spawn(async move {
            let outcome = match api.create_message(&outgoing).await {
                Ok(saved) => MessageOutcome::MessageUpdated {
                    temp_id: tid,
                    message: saved,
                },
                Err(e) => {
                    warn!("Message persistence failed: {}", e);
                    MessageOutcome::MessageFailed { temp_id: tid }
                }
            };

            // Apply locally first, then fan out so every other client
            // holding the temp record reconciles too.
            reconcile(&store, &toasts, outcome.clone()).await;
            let frame = ClientFrame::Broadcast {
                channel: ChannelName::messages(),
                data: Event::MessageUpdate(outcome),
            };
            if let Err(e) = socket.send(&frame).await {
                debug!("Reconciliation broadcast failed: {}", e);
            }
        });

        temp_id
    }

    /// Handle one event from the message channel.
    pub async fn handle_event(&self, event: Event) {
        match event {
            Event::MessageSent(message) => self.on_message_sent(message).await,
            Event::MessageUpdate(outcome) => self.apply_outcome(outcome).await,
            other => debug!("Ignoring {} on the message channel", other.name()),
        }
    }

    /// Apply a reconciliation outcome. Outcomes for unknown temp ids are
    /// no-ops: our own outcome is applied locally before the relay echoes
    /// it back.
    pub async fn apply_outcome(&self, outcome: MessageOutcome) {
        reconcile(&self.store, &self.toasts, outcome).await;
    }

    async fn on_message_sent(&self, message: ChatMessage) {
        // Our own relay echo: the temp record is already in the store.
        if let Some(temp_id) = &message.temp_id {
            if message.from_user_id == self.current_user
                && self.store.lock().await.is_pending(temp_id)
            {
                return;
            }
        }

        let peer = if message.from_user_id == self.current_user {
            message.to_user_id
        } else {
            message.from_user_id
        };
        self.store.lock().await.insert(peer, message.clone());
        self.notify_message(&message).await;
    }

    /// Toast decision: never for self-sent messages, never while the
    /// sender's conversation is open.
    async fn notify_message(&self, message: &ChatMessage) {
        if message.from_user_id == self.current_user {
            return;
        }
        if self.open_chats.read().await.contains(&message.from_user_id) {
            return;
        }
        let from = self.resolve_user(message.from_user_id).await;
        emit(
            &self.toasts,
            MessageToast::Received {
                from,
                preview: message.message.clone(),
            },
        )
        .await;
    }

    /// Resolve a user for display, memoized by id. Lookup failures fall
    /// back to a placeholder so a toast can always render; placeholders are
    /// not cached, letting later lookups recover.
    pub async fn resolve_user(&self, id: UserId) -> UserSummary {
        if let Some(user) = self.user_cache.read().await.get(&id) {
            return user.clone();
        }
        match self.api.fetch_user(id).await {
            Ok(user) => {
                self.user_cache.write().await.insert(id, user.clone());
                user
            }
            Err(e) => {
                debug!("User lookup failed for {}: {}", id, e);
                UserSummary {
                    id,
                    username: format!("User {}", id),
                }
            }
        }
    }
}

/// Apply one outcome to the store, surfacing rollbacks exactly once.
async fn reconcile(
    store: &Mutex<MessageStore>,
    toasts: &RwLock<Vec<ToastCallback>>,
    outcome: MessageOutcome,
) {
    match outcome {
        MessageOutcome::MessageUpdated { temp_id, message } => {
            let confirmed = store.lock().await.confirm(&temp_id, message);
            match confirmed {
                Ok(()) => debug!("Confirmed message {}", temp_id),
                Err(_) => debug!("Ignoring update for unknown temp id {}", temp_id),
            }
        }
        MessageOutcome::MessageFailed { temp_id } => {
            let removed = store.lock().await.fail(&temp_id);
            match removed {
                Ok(_) => {
                    warn!("Message {} failed to persist, rolled back", temp_id);
                    emit(toasts, MessageToast::SendFailed { temp_id }).await;
                }
                Err(_) => debug!("Ignoring failure for unknown temp id {}", temp_id),
            }
        }
    }
}

async fn emit(toasts: &RwLock<Vec<ToastCallback>>, toast: MessageToast) {
    for callback in toasts.read().await.iter() {
        callback(toast.clone());
    }
}
