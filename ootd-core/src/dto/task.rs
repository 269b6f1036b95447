//! Task DTOs for backend communication

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::task::TaskStatus;

/// Response to a task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInitResponse {
    pub success: bool,
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub message: String,
    /// Relative URL to poll for this task's status
    #[serde(default)]
    pub check_url: Option<String>,
}

/// Response to a task status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: TaskStatus,
    /// Human-readable progress description
    #[serde(default)]
    pub progress: Option<String>,
    /// Opaque result payload, present once completed
    #[serde(default)]
    pub result: Option<JsonValue>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TaskStatusResponse {
    /// Builds a successful non-terminal response
    pub fn in_progress(status: TaskStatus, progress: impl Into<String>) -> Self {
        Self {
            success: true,
            task_id: None,
            status,
            progress: Some(progress.into()),
            result: None,
            error_message: None,
            message: None,
        }
    }

    /// Builds a `completed` response carrying a result payload
    pub fn completed(result: JsonValue) -> Self {
        Self {
            success: true,
            task_id: None,
            status: TaskStatus::Completed,
            progress: None,
            result: Some(result),
            error_message: None,
            message: None,
        }
    }

    /// Builds an `error` response
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            success: true,
            task_id: None,
            status: TaskStatus::Error,
            progress: None,
            result: None,
            error_message: Some(error_message.into()),
            message: None,
        }
    }

    /// Best available description of a failure reported by this response
    pub fn failure_message(&self) -> String {
        self.error_message
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Task failed".to_string())
    }
}

/// Task entry as stored by the backend (admin listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<String>,
    /// Backend-local ISO-8601 timestamp (no zone)
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Response to the admin task listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub tasks: Vec<TaskRecord>,
    pub count: usize,
}

/// Generic acknowledgement returned by delete operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}
