//! Analyze command handler
//!
//! Submits a style analysis task and follows it, avatar stage included.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use ootd_core::domain::task::TaskKind;
use ootd_core::dto::analysis::StyleAnalysisRequest;
use tracing::debug;

use super::watch::{ensure_completed, watch_task};
use crate::config::Config;

/// Arguments of the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Uploaded style reference image name (repeatable)
    #[arg(long = "style", value_name = "NAME")]
    style_images: Vec<String>,

    /// Uploaded user photo name (repeatable)
    #[arg(long = "user", value_name = "NAME")]
    user_images: Vec<String>,

    /// Free-text style requirements
    #[arg(long)]
    text: Option<String>,

    /// Nickname used in the reply
    #[arg(long)]
    name: Option<String>,

    /// Skip avatar generation
    #[arg(long)]
    no_avatar: bool,

    /// Page session the images were uploaded under
    #[arg(long = "page-session", value_name = "ID")]
    page_session_id: Option<String>,

    /// Use the debug analysis endpoint
    #[arg(long)]
    debug: bool,
}

impl AnalyzeArgs {
    fn into_request(self) -> StyleAnalysisRequest {
        fn non_empty(names: Vec<String>) -> Option<Vec<String>> {
            (!names.is_empty()).then_some(names)
        }

        StyleAnalysisRequest {
            style_image_names: non_empty(self.style_images),
            user_image_names: non_empty(self.user_images),
            text_requirements: self.text,
            user_name: self.name,
            generate_avatar: !self.no_avatar,
            page_session_id: self.page_session_id,
        }
    }
}

/// Handle the analyze command
pub async fn handle_analyze_command(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let ctx = config.app_context()?;
    let use_debug_endpoint = args.debug;
    let request = args.into_request();
    debug!(?request, use_debug_endpoint, "Submitting style analysis");

    let task = if use_debug_endpoint {
        ctx.client().submit_style_analysis_debug(&request).await
    } else {
        ctx.client().submit_style_analysis(&request).await
    }
    .context("Failed to submit style analysis")?;

    println!("{}", "✓ Analysis submitted".green().bold());
    println!("  Task ID: {}", task.task_id.bold());
    if !task.message.is_empty() {
        println!("  {}", task.message.dimmed());
    }
    println!();

    let outcome = watch_task(&ctx, &task.task_id, TaskKind::Primary).await?;
    ensure_completed(TaskKind::Primary, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            style_images: Vec::new(),
            user_images: Vec::new(),
            text: None,
            name: None,
            no_avatar: false,
            page_session_id: None,
            debug: false,
        }
    }

    #[test]
    fn test_request_from_args() {
        let request = AnalyzeArgs {
            style_images: vec!["a.jpg".to_string()],
            page_session_id: Some("page-1".to_string()),
            no_avatar: true,
            ..args()
        }
        .into_request();

        assert_eq!(request.style_image_names, Some(vec!["a.jpg".to_string()]));
        assert_eq!(request.user_image_names, None);
        assert!(!request.generate_avatar);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_args_fail_validation() {
        let request = args().into_request();
        assert!(request.generate_avatar);
        assert!(request.validate().is_err());
    }
}
