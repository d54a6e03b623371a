//! HTTP routing and broadcast endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use tempo_shared::{
    CallNotification, ChannelName, ChatMessage, Envelope, Event, FriendAction, FriendEvent,
    TaskPayload, TaskUpdate, UserId,
};

use crate::relay::RelayState;

/// Create the application router
pub fn create_router(state: Arc<RelayState>) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/ws", get(crate::websocket::handle_websocket))
        .route("/status", get(status))
        .route("/health", get(health_check))
        .route("/broadcast/message", post(broadcast_message))
        .route("/broadcast/task-update", post(broadcast_task_update))
        .route(
            "/broadcast/friend-notification",
            post(broadcast_friend_notification),
        )
        .route(
            "/broadcast/video-call-notification",
            post(broadcast_video_call),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build CORS layer from config. Permissive when no origins are configured.
fn build_cors_layer(origins: &Option<String>) -> CorsLayer {
    match origins {
        Some(list) if !list.is_empty() => {
            let parsed: Vec<_> = list
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
        }
        _ => CorsLayer::permissive(),
    }
}

/// Health check — no sensitive data
async fn health_check() -> &'static str {
    "OK"
}

/// Relay status: the only introspection surface
async fn status(State(state): State<Arc<RelayState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "WebSocket server running",
        "clients": state.client_count(),
        "port": state.config.port,
    }))
}

// ---------------------------------------------------------------------------
// Broadcast endpoints
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct MessageBroadcast {
    message: ChatMessage,
    #[serde(default)]
    channel: Option<ChannelName>,
}

async fn broadcast_message(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<MessageBroadcast>,
) -> Json<serde_json::Value> {
    let channel = body.channel.unwrap_or_else(ChannelName::messages);
    let envelope = Envelope {
        channel,
        event: Event::MessageSent(body.message.clone()),
    };
    let delivered = state.broadcast(&envelope).await;

    Json(json!({
        "status": "Message broadcast",
        "clients": delivered,
        "message": body.message,
    }))
}

#[derive(Deserialize)]
struct TaskBroadcast {
    task: TaskPayload,
    #[serde(default)]
    channel: Option<ChannelName>,
}

async fn broadcast_task_update(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<TaskBroadcast>,
) -> Json<serde_json::Value> {
    let channel = body.channel.unwrap_or_else(ChannelName::tasks);
    let envelope = Envelope {
        channel,
        event: Event::TaskUpdated(TaskUpdate { task: body.task }),
    };
    let delivered = state.broadcast(&envelope).await;

    Json(json!({
        "status": "Task update broadcast",
        "clients": delivered,
    }))
}

#[derive(Deserialize)]
struct FriendBroadcast {
    action: FriendAction,
    user_id: UserId,
    friend_id: UserId,
    #[serde(default)]
    friendship_data: Option<serde_json::Value>,
    #[serde(default)]
    user_data: Option<serde_json::Value>,
    #[serde(default)]
    friend_data: Option<serde_json::Value>,
    #[serde(default)]
    channel: Option<ChannelName>,
}

async fn broadcast_friend_notification(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<FriendBroadcast>,
) -> Json<serde_json::Value> {
    let channel = body.channel.unwrap_or_else(ChannelName::friends);
    let envelope = Envelope {
        channel,
        event: Event::FriendNotification(FriendEvent {
            action: body.action,
            user_id: body.user_id,
            friend_id: body.friend_id,
            friendship_data: body.friendship_data,
            user_data: body.user_data,
            friend_data: body.friend_data,
        }),
    };
    let delivered = state.broadcast(&envelope).await;

    Json(json!({
        "status": "Friend notification broadcast",
        "clients": delivered,
        "action": body.action,
    }))
}

#[derive(Deserialize)]
struct VideoCallBroadcast {
    #[serde(flatten)]
    notification: CallNotification,
    #[serde(default)]
    channel: Option<ChannelName>,
}

async fn broadcast_video_call(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<VideoCallBroadcast>,
) -> Json<serde_json::Value> {
    let kind = body.notification.signal.kind();
    let channel = body.channel.unwrap_or_else(ChannelName::video_calls);
    let envelope = Envelope {
        channel,
        event: Event::VideoCallNotification(body.notification),
    };
    let delivered = state.broadcast(&envelope).await;

    Json(json!({
        "status": "Video call notification broadcast",
        "clients": delivered,
        "type": kind,
    }))
}
