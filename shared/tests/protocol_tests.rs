//! Wire protocol tests
//!
//! Tests the JSON frame and envelope shapes both sides depend on.

use tempo_shared::{
    CallNotification, CallSignal, ChannelName, ChatMessage, ClientFrame, Control, Envelope, Event,
    MessageOutcome, ServerMessage, TaskUpdate, TempId, UserId,
};

fn sample_message() -> ChatMessage {
    ChatMessage {
        id: None,
        temp_id: Some(TempId::from_parts(1704067200000, 0)),
        from_user_id: UserId(1),
        to_user_id: UserId(2),
        message: "hi".to_string(),
        created_at: 1704067200000,
        is_temporary: true,
    }
}

#[test]
fn test_envelope_wire_shape() {
    let envelope = Envelope {
        channel: ChannelName::messages(),
        event: Event::MessageSent(sample_message()),
    };

    let json = serde_json::to_value(&envelope).expect("Failed to serialize");

    assert_eq!(json["event"], "MessageSent");
    assert_eq!(json["channel"], "message-channel");
    assert_eq!(json["data"]["message"], "hi");
    assert_eq!(json["data"]["is_temporary"], true);
    // Unset optional fields stay off the wire
    assert!(json["data"].get("id").is_none());
}

#[test]
fn test_envelope_round_trip() {
    let envelope = Envelope {
        channel: ChannelName::tasks(),
        event: Event::TaskUpdated(TaskUpdate {
            task: serde_json::from_value(serde_json::json!({"id": 1, "status": "completed"}))
                .expect("Failed to build task"),
        }),
    };

    let encoded = serde_json::to_string(&envelope).expect("Failed to serialize");
    let decoded: Envelope = serde_json::from_str(&encoded).expect("Failed to deserialize");

    assert_eq!(envelope, decoded);
}

#[test]
fn test_unknown_event_rejected() {
    let raw = r#"{"event":"Nonsense","channel":"message-channel","data":{}}"#;
    assert!(serde_json::from_str::<Envelope>(raw).is_err());
}

#[test]
fn test_subscribe_frame_parses() {
    let raw = r#"{"type":"subscribe","channel":"task-updates"}"#;
    let frame: ClientFrame = serde_json::from_str(raw).expect("Failed to parse");

    assert_eq!(
        frame,
        ClientFrame::Subscribe {
            channel: ChannelName::tasks(),
        }
    );
}

#[test]
fn test_unknown_frame_type_rejected() {
    let raw = r#"{"type":"shout","data":{}}"#;
    assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
}

#[test]
fn test_broadcast_frame_round_trip() {
    let frame = ClientFrame::Broadcast {
        channel: ChannelName::messages(),
        data: Event::MessageUpdate(MessageOutcome::MessageFailed {
            temp_id: TempId::from_parts(1704067200000, 7),
        }),
    };

    let encoded = serde_json::to_string(&frame).expect("Failed to serialize");
    let decoded: ClientFrame = serde_json::from_str(&encoded).expect("Failed to deserialize");

    assert_eq!(frame, decoded);
}

#[test]
fn test_message_outcome_tags() {
    let updated = MessageOutcome::MessageUpdated {
        temp_id: TempId::from_parts(1, 0),
        message: sample_message(),
    };
    let failed = MessageOutcome::MessageFailed {
        temp_id: TempId::from_parts(1, 0),
    };

    let updated_json = serde_json::to_value(&updated).expect("Failed to serialize");
    let failed_json = serde_json::to_value(&failed).expect("Failed to serialize");

    assert_eq!(updated_json["type"], "message_updated");
    assert_eq!(failed_json["type"], "message_failed");
}

#[test]
fn test_call_signal_camel_case_fields() {
    let raw = r#"{
        "type": "invite",
        "callId": "call-9",
        "meetingId": "room-42",
        "token": "tok",
        "from_user": 1,
        "to_user": 2
    }"#;

    let signal: CallSignal = serde_json::from_str(raw).expect("Failed to parse");
    assert_eq!(signal.call_id(), "call-9");
    assert_eq!(signal.from_user(), UserId(1));
    assert_eq!(signal.kind(), "invite");

    let json = serde_json::to_value(&signal).expect("Failed to serialize");
    assert_eq!(json["callId"], "call-9");
    assert_eq!(json["meetingId"], "room-42");
}

#[test]
fn test_call_notification_target_fallback() {
    let signal = CallSignal::Decline {
        call_id: "call-9".to_string(),
        from_user: UserId(2),
        to_user: UserId(1),
    };

    let implicit = CallNotification {
        signal: signal.clone(),
        target_user_id: None,
    };
    assert_eq!(implicit.target(), UserId(1));

    let explicit = CallNotification {
        signal,
        target_user_id: Some(UserId(5)),
    };
    assert_eq!(explicit.target(), UserId(5));
}

#[test]
fn test_server_message_disambiguation() {
    let error_raw = r#"{"type":"error","message":"malformed frame"}"#;
    let parsed: ServerMessage = serde_json::from_str(error_raw).expect("Failed to parse");
    assert_eq!(
        parsed,
        ServerMessage::Control(Control::Error {
            message: "malformed frame".to_string(),
        })
    );

    let envelope_raw = r#"{
        "event": "FriendNotification",
        "channel": "friend-notifications",
        "data": {"action": "request", "user_id": 1, "friend_id": 2}
    }"#;
    match serde_json::from_str::<ServerMessage>(envelope_raw).expect("Failed to parse") {
        ServerMessage::Envelope(envelope) => {
            assert_eq!(envelope.channel, ChannelName::friends());
            assert_eq!(envelope.event.name(), "FriendNotification");
        }
        other => panic!("Expected envelope, got {:?}", other),
    }
}

#[test]
fn test_task_payload_preserves_extra_fields() {
    let raw = r#"{"task":{"id":1,"status":"completed","title":"water plants"}}"#;
    let update: TaskUpdate = serde_json::from_str(raw).expect("Failed to parse");

    assert_eq!(update.task.id, 1);
    assert_eq!(
        update.task.fields.get("status"),
        Some(&serde_json::json!("completed"))
    );

    let json = serde_json::to_value(&update).expect("Failed to serialize");
    assert_eq!(json["task"]["title"], "water plants");
}

#[test]
fn test_temp_id_format() {
    let a = TempId::from_parts(1704067200000, 0);
    let b = TempId::from_parts(1704067200000, 1);

    assert_eq!(a.as_str(), "temp-1704067200000-0");
    assert_ne!(a, b);
}
