//! Task update payloads

use serde::{Deserialize, Serialize};

/// A task record as the backend shapes it. Only the id is required; every
/// other field is forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Backend task id
    pub id: i64,
    /// Remaining backend fields (status, title, ...)
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// One task state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// The task that changed
    pub task: TaskPayload,
}
