//! Optimistic send and reconciliation tests
//!
//! The relay is deliberately unreachable here: reconciliation is applied
//! locally before it is broadcast, so the store semantics are testable
//! without a live socket.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempo_client::api::{MessageApi, NewMessage, UserSummary};
use tempo_client::error::{ClientError, Result};
use tempo_client::messages::{MessageService, MessageToast};
use tempo_client::socket::{ReconnectPolicy, SocketClient};
use tempo_shared::{ChatMessage, Event, MessageOutcome, TempId, UserId};

/// Backend stub: either persists with a fixed permanent id or rejects
/// everything.
struct StubApi {
    fail_create: bool,
    fail_fetch: bool,
}

impl MessageApi for StubApi {
    fn create_message(
        &self,
        message: &NewMessage,
    ) -> impl Future<Output = Result<ChatMessage>> + Send {
        let fail = self.fail_create;
        let saved = ChatMessage {
            id: Some(42),
            temp_id: None,
            from_user_id: message.from_user_id,
            to_user_id: message.to_user_id,
            message: message.message.clone(),
            created_at: 1704067200000,
            is_temporary: false,
        };
        async move {
            if fail {
                Err(ClientError::Api("Failed to create message".to_string()))
            } else {
                Ok(saved)
            }
        }
    }

    fn fetch_user(&self, id: UserId) -> impl Future<Output = Result<UserSummary>> + Send {
        let fail = self.fail_fetch;
        async move {
            if fail {
                Err(ClientError::Api("Failed to fetch user".to_string()))
            } else {
                Ok(UserSummary {
                    id,
                    username: format!("user-{}", id),
                })
            }
        }
    }
}

/// A socket whose relay does not exist. Port 9 (discard) refuses quickly;
/// the driver backs off in the background while the service runs locally.
fn offline_socket() -> Arc<SocketClient> {
    Arc::new(SocketClient::connect(
        "ws://127.0.0.1:9/ws",
        ReconnectPolicy {
            base_delay: Duration::from_millis(10),
            max_attempts: 1,
        },
    ))
}

async fn attach(fail_create: bool, fail_fetch: bool) -> Arc<MessageService<StubApi>> {
    MessageService::attach(
        offline_socket(),
        Arc::new(StubApi {
            fail_create,
            fail_fetch,
        }),
        UserId(1),
    )
    .await
}

async fn wait_settled(service: &MessageService<StubApi>, temp_id: &TempId) {
    for _ in 0..200 {
        if !service.has_pending(temp_id).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("persistence outcome never applied");
}

fn inbound_message(from: UserId, to: UserId, body: &str) -> ChatMessage {
    ChatMessage {
        id: Some(7),
        temp_id: None,
        from_user_id: from,
        to_user_id: to,
        message: body.to_string(),
        created_at: 1704067200000,
        is_temporary: false,
    }
}

#[tokio::test]
async fn test_optimistic_send_confirms() {
    let service = attach(false, false).await;

    let temp_id = service
        .send_message(NewMessage {
            from_user_id: UserId(1),
            to_user_id: UserId(2),
            message: "hi".to_string(),
        })
        .await;

    // The optimistic record is visible immediately
    let conversation = service.conversation(UserId(2)).await;
    assert_eq!(conversation.len(), 1);
    assert!(conversation[0].is_temporary);
    assert_eq!(conversation[0].temp_id.as_ref(), Some(&temp_id));
    assert_eq!(conversation[0].id, None);

    wait_settled(&service, &temp_id).await;

    // Exactly one message, carrying the permanent id
    let conversation = service.conversation(UserId(2)).await;
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation[0].id, Some(42));
    assert!(!conversation[0].is_temporary);
}

#[tokio::test]
async fn test_failed_send_rolls_back() {
    let service = attach(true, false).await;

    let failures = Arc::new(AtomicUsize::new(0));
    {
        let failures = failures.clone();
        service
            .on_toast(move |toast| {
                if matches!(toast, MessageToast::SendFailed { .. }) {
                    failures.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;
    }

    let temp_id = service
        .send_message(NewMessage {
            from_user_id: UserId(1),
            to_user_id: UserId(2),
            message: "hi".to_string(),
        })
        .await;
    wait_settled(&service, &temp_id).await;

    // The temporary record is gone and the failure surfaced exactly once
    let conversation = service.conversation(UserId(2)).await;
    assert!(conversation.is_empty());
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    // Replaying the failure (e.g. the relay echo) is a no-op
    service
        .apply_outcome(MessageOutcome::MessageFailed { temp_id })
        .await;
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_update_for_unknown_temp_id_is_noop() {
    let service = attach(false, false).await;

    let outcome = MessageOutcome::MessageUpdated {
        temp_id: TempId::from_parts(1704067200000, 999),
        message: inbound_message(UserId(1), UserId(2), "ghost"),
    };
    service.apply_outcome(outcome).await;

    // No crash, no insert
    assert!(service.conversation(UserId(2)).await.is_empty());
}

#[tokio::test]
async fn test_toast_suppressed_while_chat_open() {
    let service = attach(false, false).await;

    let received = Arc::new(AtomicUsize::new(0));
    {
        let received = received.clone();
        service
            .on_toast(move |toast| {
                if matches!(toast, MessageToast::Received { .. }) {
                    received.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;
    }

    service.set_chat_open(UserId(7)).await;
    service
        .handle_event(Event::MessageSent(inbound_message(
            UserId(7),
            UserId(1),
            "while open",
        )))
        .await;
    assert_eq!(received.load(Ordering::SeqCst), 0);

    service.set_chat_closed(UserId(7)).await;
    service
        .handle_event(Event::MessageSent(inbound_message(
            UserId(7),
            UserId(1),
            "while closed",
        )))
        .await;
    assert_eq!(received.load(Ordering::SeqCst), 1);

    // Both messages landed in the conversation regardless
    assert_eq!(service.conversation(UserId(7)).await.len(), 2);
}

#[tokio::test]
async fn test_self_sent_messages_never_toast() {
    let service = attach(false, false).await;

    let received = Arc::new(AtomicUsize::new(0));
    {
        let received = received.clone();
        service
            .on_toast(move |_| {
                received.fetch_add(1, Ordering::SeqCst);
            })
            .await;
    }

    // A message from the current user in another client: stored, not toasted
    service
        .handle_event(Event::MessageSent(inbound_message(
            UserId(1),
            UserId(2),
            "from another tab",
        )))
        .await;

    assert_eq!(received.load(Ordering::SeqCst), 0);
    assert_eq!(service.conversation(UserId(2)).await.len(), 1);
}

#[tokio::test]
async fn test_user_resolution_placeholder_on_failure() {
    let service = attach(false, true).await;
    let user = service.resolve_user(UserId(9)).await;
    assert_eq!(user.username, "User 9");
}

#[tokio::test]
async fn test_user_resolution_memoized() {
    let service = attach(false, false).await;
    let first = service.resolve_user(UserId(9)).await;
    let second = service.resolve_user(UserId(9)).await;
    assert_eq!(first.username, "user-9");
    assert_eq!(first, second);
}
