//! Task status source
//!
//! The poller never talks HTTP directly; it asks a [`TaskStatusSource`] for
//! the current status of a task. The backend client is the production
//! implementation, tests script their own.

use anyhow::Result;
use async_trait::async_trait;
use ootd_client::BackendClient;
use ootd_core::domain::task::TaskKind;
use ootd_core::dto::task::TaskStatusResponse;

/// Source of task status reports
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    /// Fetches the current status of a task
    ///
    /// # Arguments
    /// * `kind` - Which endpoint family the task belongs to
    /// * `task_id` - The server-assigned task id
    async fn fetch_status(&self, kind: TaskKind, task_id: &str) -> Result<TaskStatusResponse>;
}

#[async_trait]
impl TaskStatusSource for BackendClient {
    async fn fetch_status(&self, kind: TaskKind, task_id: &str) -> Result<TaskStatusResponse> {
        let response = match kind {
            TaskKind::Primary => self.get_task_status(task_id).await?,
            TaskKind::Avatar => self.get_avatar_task_status(task_id).await?,
        };
        Ok(response)
    }
}
