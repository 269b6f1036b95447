//! Style analysis DTOs
//!
//! The submission body for a style-analysis task and a typed view of the
//! payload a completed analysis task returns.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Request to start a style analysis task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleAnalysisRequest {
    /// Uploaded reference images the user likes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_image_names: Option<Vec<String>>,
    /// Uploaded photos of the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_requirements: Option<String>,
    /// Nickname used to personalize the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default = "default_generate_avatar")]
    pub generate_avatar: bool,
    /// Page-level session used by the backend to locate uploaded images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_session_id: Option<String>,
}

fn default_generate_avatar() -> bool {
    true
}

impl Default for StyleAnalysisRequest {
    fn default() -> Self {
        Self {
            style_image_names: None,
            user_image_names: None,
            text_requirements: None,
            user_name: None,
            generate_avatar: true,
            page_session_id: None,
        }
    }
}

impl StyleAnalysisRequest {
    fn has_style_images(&self) -> bool {
        self.style_image_names.as_ref().is_some_and(|names| !names.is_empty())
    }

    fn has_user_images(&self) -> bool {
        self.user_image_names.as_ref().is_some_and(|names| !names.is_empty())
    }

    fn has_text(&self) -> bool {
        self.text_requirements
            .as_ref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    /// Checks the request before it is sent
    ///
    /// At least one input is required, and image names are only resolvable
    /// together with a page session id.
    pub fn validate(&self) -> Result<(), String> {
        if !self.has_style_images() && !self.has_user_images() && !self.has_text() {
            return Err(
                "at least one of style images, user images or text requirements is required"
                    .to_string(),
            );
        }

        let has_images = self.has_style_images() || self.has_user_images();
        let has_page_session = self
            .page_session_id
            .as_ref()
            .is_some_and(|id| !id.is_empty());
        if has_images && !has_page_session {
            return Err("page_session_id is required when image names are given".to_string());
        }

        Ok(())
    }
}

/// Avatar sub-task information attached to an analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarInfo {
    /// `disabled`, `pending`, `running`, `processing`, `completed`, `error`, `no_user_images`
    pub status: String,
    #[serde(default)]
    pub avatar_task_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub avatar_filename: Option<String>,
    #[serde(default)]
    pub fallback_avatar_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_placeholder: bool,
}

impl AvatarInfo {
    /// Returns the avatar task id if generation is still in progress
    pub fn pending_task_id(&self) -> Option<&str> {
        match self.status.as_str() {
            "pending" | "running" | "processing" => self
                .avatar_task_id
                .as_deref()
                .filter(|id| !id.trim().is_empty()),
            _ => None,
        }
    }
}

/// Result payload of a completed style analysis task
///
/// A completed task may still carry `success = false` when the analysis
/// itself failed (bad input, unreadable images); `content` then holds the
/// user-facing explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: JsonValue,
    #[serde(default)]
    pub avatar_info: Option<AvatarInfo>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisResult {
    /// Decodes an opaque task result
    pub fn from_value(value: &JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Avatar task id announced by this result, if generation is still running
    pub fn pending_avatar_task(&self) -> Option<&str> {
        self.avatar_info.as_ref().and_then(AvatarInfo::pending_task_id)
    }

    /// Backend-side error category from `metadata.error_type`
    pub fn error_type(&self) -> Option<&str> {
        self.metadata.get("error_type").and_then(JsonValue::as_str)
    }
}

/// Avatar task result payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub avatar_filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub model: Option<String>,
}
