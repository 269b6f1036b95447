//! Task-related API endpoints

use crate::{BackendClient, handle_response};
use crate::error::{ClientError, Result};
use ootd_core::dto::analysis::StyleAnalysisRequest;
use ootd_core::dto::task::{
    AckResponse, HealthResponse, TaskInitResponse, TaskListResponse, TaskStatusResponse,
};
use reqwest::Method;
use tracing::debug;

const STYLE_API: &str = "/api/style";

/// Builds `{STYLE_API}/{route}/{task_id}`
///
/// The id must be a single path segment: blank ids and ids carrying path,
/// query, fragment or escape characters are rejected.
fn task_path(route: &str, task_id: &str) -> Result<String> {
    if task_id.trim().is_empty() {
        return Err(ClientError::InvalidRequest("task_id cannot be empty".to_string()));
    }

    let unsafe_char = task_id.chars().any(|c| {
        matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
    });
    if unsafe_char || task_id == "." || task_id == ".." {
        return Err(ClientError::InvalidRequest(format!(
            "task_id is not a valid path segment: {:?}",
            task_id
        )));
    }

    Ok(format!("{}/{}/{}", STYLE_API, route, task_id))
}

impl BackendClient {
    // =============================================================================
    // Task Submission
    // =============================================================================

    /// Submit a style analysis task
    ///
    /// The request is validated locally first; the backend answers
    /// immediately with a task id to poll.
    ///
    /// # Example
    /// ```no_run
    /// # use ootd_client::BackendClient;
    /// # use ootd_core::dto::analysis::StyleAnalysisRequest;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = BackendClient::new("http://localhost:8000");
    /// let task = client.submit_style_analysis(&StyleAnalysisRequest {
    ///     text_requirements: Some("minimalist, neutral colors".to_string()),
    ///     generate_avatar: false,
    ///     ..Default::default()
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_style_analysis(
        &self,
        req: &StyleAnalysisRequest,
    ) -> Result<TaskInitResponse> {
        self.submit(&format!("{}/analyze", STYLE_API), req).await
    }

    /// Submit a style analysis task on the debug endpoint
    ///
    /// Same contract as [`submit_style_analysis`](Self::submit_style_analysis);
    /// the backend keeps extra diagnostic data in the result.
    pub async fn submit_style_analysis_debug(
        &self,
        req: &StyleAnalysisRequest,
    ) -> Result<TaskInitResponse> {
        self.submit(&format!("{}/analyze-debug", STYLE_API), req).await
    }

    async fn submit(&self, path: &str, req: &StyleAnalysisRequest) -> Result<TaskInitResponse> {
        req.validate().map_err(ClientError::InvalidRequest)?;

        let response = self.request(Method::POST, path).json(req).send().await?;
        let init: TaskInitResponse = handle_response(response).await?;

        if !init.success || init.task_id.is_empty() {
            return Err(ClientError::api_error(
                200,
                format!("Task was not accepted: {}", init.message),
            ));
        }

        debug!(task_id = %init.task_id, "Task submitted");
        Ok(init)
    }

    // =============================================================================
    // Task Status
    // =============================================================================

    /// Get the status of a primary analysis task
    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse> {
        let path = task_path("task-status", task_id)?;
        let response = self.request(Method::GET, &path).send().await?;

        handle_response(response).await
    }

    /// Get the status of an avatar generation task
    pub async fn get_avatar_task_status(&self, avatar_task_id: &str) -> Result<TaskStatusResponse> {
        let path = task_path("avatar-task-status", avatar_task_id)?;
        let response = self.request(Method::GET, &path).send().await?;

        handle_response(response).await
    }

    // =============================================================================
    // Task Administration
    // =============================================================================

    /// List every task the backend currently tracks
    pub async fn list_tasks(&self) -> Result<TaskListResponse> {
        let path = format!("{}/tasks", STYLE_API);
        let response = self.request(Method::GET, &path).send().await?;

        handle_response(response).await
    }

    /// Delete a single task record
    ///
    /// A 404 is reported as [`ClientError::NotFound`].
    pub async fn delete_task(&self, task_id: &str) -> Result<AckResponse> {
        let path = task_path("tasks", task_id)?;
        let response = self.request(Method::DELETE, &path).send().await?;

        match handle_response(response).await {
            Err(e) if e.is_not_found() => Err(ClientError::NotFound(format!("task {}", task_id))),
            other => other,
        }
    }

    /// Delete every task record
    pub async fn clear_tasks(&self) -> Result<AckResponse> {
        let path = format!("{}/tasks", STYLE_API);
        let response = self.request(Method::DELETE, &path).send().await?;

        handle_response(response).await
    }

    // =============================================================================
    // Health
    // =============================================================================

    /// Check that the style-analysis service is up
    pub async fn health(&self) -> Result<HealthResponse> {
        let path = format!("{}/health", STYLE_API);
        let response = self.request(Method::GET, &path).send().await?;

        handle_response(response).await
    }
}
