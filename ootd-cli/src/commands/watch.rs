//! Watch command handler
//!
//! Follows a task through the poller and renders its events. Shared by
//! `analyze`, which watches the task it just submitted.

use anyhow::{Result, bail};
use colored::*;
use ootd_core::domain::session::{PollEvent, PollOutcome};
use ootd_core::domain::task::TaskKind;
use ootd_core::dto::analysis::{AnalysisResult, AvatarResult};
use ootd_poller::AppContext;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::{debug, info};

use super::colorize_status;
use crate::config::Config;

/// Handle the watch command
pub async fn handle_watch_command(task_id: &str, avatar: bool, config: &Config) -> Result<()> {
    let ctx = config.app_context()?;
    let kind = if avatar {
        TaskKind::Avatar
    } else {
        TaskKind::Primary
    };

    let outcome = watch_task(&ctx, task_id, kind).await?;
    ensure_completed(kind, &outcome)
}

/// Fails unless the watched task completed
pub(crate) fn ensure_completed(kind: TaskKind, outcome: &PollOutcome) -> Result<()> {
    match outcome {
        PollOutcome::Completed { .. } => Ok(()),
        PollOutcome::Failed { message } => bail!("{} task failed: {}", kind, message),
        PollOutcome::TimedOut => bail!("{} task did not finish in time", kind),
        PollOutcome::Cancelled => bail!("{} task watch was cancelled", kind),
    }
}

/// Tracks which sessions the page is still waiting on
#[derive(Debug, Default)]
struct WatchProgress {
    live: HashSet<TaskKind>,
    /// A completed primary announced an avatar session that has not started yet
    awaiting_avatar: bool,
    outcome: Option<PollOutcome>,
}

impl WatchProgress {
    fn observe(&mut self, watched: TaskKind, event: &PollEvent) {
        let kind = event.kind();
        match event {
            PollEvent::Started { .. } => {
                self.live.insert(kind);
                if kind == TaskKind::Avatar {
                    self.awaiting_avatar = false;
                }
            }
            PollEvent::Progress { .. } => {}
            PollEvent::Terminal { outcome, .. } => {
                self.live.remove(&kind);
                match kind {
                    TaskKind::Primary => self.awaiting_avatar = announces_avatar(outcome),
                    // Also covers an avatar session that never got started
                    TaskKind::Avatar => self.awaiting_avatar = false,
                }
                if kind == watched {
                    self.outcome = Some(outcome.clone());
                }
            }
        }
    }

    fn is_done(&self) -> bool {
        self.outcome.is_some() && self.live.is_empty() && !self.awaiting_avatar
    }
}

fn announces_avatar(outcome: &PollOutcome) -> bool {
    let PollOutcome::Completed {
        result: Some(result),
    } = outcome
    else {
        return false;
    };

    AnalysisResult::from_value(result)
        .map(|analysis| analysis.pending_avatar_task().is_some())
        .unwrap_or(false)
}

/// Watches `task_id` until it and any avatar stage it triggers settle
///
/// Ctrl-C tears the page down, which cancels every session.
///
/// # Returns
/// The outcome of the watched session
pub(crate) async fn watch_task(
    ctx: &AppContext,
    task_id: &str,
    kind: TaskKind,
) -> Result<PollOutcome> {
    let mut page = ctx.open_page();
    page.poller().start(task_id, kind)?;

    let mut progress = WatchProgress::default();
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = page.next_event() => {
                let Some(event) = event else { break };
                debug!(session_id = %event.session_id(), kind = %event.kind(), "Poll event");
                print_event(&event);
                progress.observe(kind, &event);
                if progress.is_done() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                info!(%kind, task_id, "Watch interrupted");
                println!();
                println!("{}", "Interrupted, cancelling...".yellow());
                page.teardown();
            }
        }
    }

    page.teardown();
    Ok(progress.outcome.unwrap_or(PollOutcome::Cancelled))
}

fn print_event(event: &PollEvent) {
    match event {
        PollEvent::Started {
            kind,
            task_id,
            max_attempts,
            ..
        } => {
            println!(
                "{} Watching {} task {} (up to {} checks)",
                "▸".cyan(),
                kind,
                task_id.dimmed(),
                max_attempts
            );
        }
        PollEvent::Progress {
            kind,
            attempt,
            status,
            progress,
            ..
        } => {
            println!(
                "  [{}] {} #{} {}",
                kind,
                colorize_status(status),
                attempt,
                progress.as_deref().unwrap_or("").dimmed()
            );
        }
        PollEvent::Terminal {
            kind,
            attempt,
            outcome,
            ..
        } => print_outcome(*kind, *attempt, outcome),
    }
}

fn print_outcome(kind: TaskKind, attempt: u32, outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Completed { result } => {
            println!(
                "{} {} task completed after {} check(s)",
                "✓".green(),
                kind,
                attempt
            );
            if let Some(result) = result {
                match kind {
                    TaskKind::Primary => print_analysis(result),
                    TaskKind::Avatar => print_avatar(result),
                }
            }
        }
        PollOutcome::Failed { message } => {
            println!("{} {} task failed: {}", "✗".red(), kind, message.red());
        }
        PollOutcome::TimedOut => {
            println!(
                "{} {} task still unfinished after {} check(s), giving up",
                "⏱".yellow(),
                kind,
                attempt
            );
        }
        PollOutcome::Cancelled => {
            println!("{} {} task watch cancelled", "■".dimmed(), kind);
        }
    }
}

fn print_analysis(result: &JsonValue) {
    let analysis = match AnalysisResult::from_value(result) {
        Ok(analysis) => analysis,
        Err(_) => {
            println!("{}", result);
            return;
        }
    };

    if !analysis.success {
        let reason = analysis.error_type().unwrap_or("analysis_failed");
        println!("{} {}", "Analysis failed:".red().bold(), reason.red());
    }

    println!("{}", "─".repeat(80).dimmed());
    println!("{}", analysis.content);
    println!("{}", "─".repeat(80).dimmed());

    if let Some(avatar) = &analysis.avatar_info {
        let url = avatar
            .avatar_url
            .as_ref()
            .or(avatar.fallback_avatar_url.as_ref());
        if analysis.pending_avatar_task().is_some() {
            println!("  Avatar:  {}", "generating...".yellow());
        } else if let Some(url) = url {
            println!("  Avatar:  {}", url.cyan());
        } else {
            println!("  Avatar:  {}", avatar.status.dimmed());
        }
    }
}

fn print_avatar(result: &JsonValue) {
    match serde_json::from_value::<AvatarResult>(result.clone()) {
        Ok(AvatarResult {
            avatar_url: Some(url),
            ..
        }) => println!("  Avatar:  {}", url.cyan()),
        _ => println!("  Avatar:  {}", result),
    }
}
