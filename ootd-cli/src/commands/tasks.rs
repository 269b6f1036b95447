//! Task command handlers
//!
//! Administrative access to the backend task store: listing, deleting
//! and clearing tasks.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use ootd_client::{BackendClient, ClientError};
use ootd_core::dto::task::TaskRecord;

use super::colorize_status;
use crate::config::Config;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// List all tasks known to the backend
    List,
    /// Delete a single task
    Delete {
        /// Task ID
        id: String,
    },
    /// Delete every task
    Clear,
}

/// Handle task commands
///
/// # Arguments
/// * `command` - The task command to execute
/// * `config` - The CLI configuration
pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    let ctx = config.app_context()?;
    let client = ctx.client();

    match command {
        TaskCommands::List => list_tasks(client).await,
        TaskCommands::Delete { id } => delete_task(client, &id).await,
        TaskCommands::Clear => clear_tasks(client).await,
    }
}

/// List all tasks
async fn list_tasks(client: &BackendClient) -> Result<()> {
    let listing = client.list_tasks().await.context("Failed to list tasks")?;

    if listing.tasks.is_empty() {
        println!("{}", "No tasks found.".yellow());
    } else {
        println!("{}", format!("Found {} task(s):", listing.count).bold());
        println!();
        for task in &listing.tasks {
            print_task_summary(task);
        }
    }

    Ok(())
}

/// Delete one task
async fn delete_task(client: &BackendClient, id: &str) -> Result<()> {
    match client.delete_task(id).await {
        Ok(_) => {
            println!("{}", format!("✓ Task {} deleted", id).green());
            Ok(())
        }
        Err(ClientError::NotFound(_)) => {
            println!("{}", format!("Task {} not found.", id).yellow());
            Ok(())
        }
        Err(e) => Err(e).context("Failed to delete task"),
    }
}

/// Delete all tasks
async fn clear_tasks(client: &BackendClient) -> Result<()> {
    let ack = client.clear_tasks().await.context("Failed to clear tasks")?;
    let message = ack.message.unwrap_or_else(|| "All tasks cleared".to_string());
    println!("{}", format!("✓ {}", message).green());
    Ok(())
}

/// Print a task summary
fn print_task_summary(task: &TaskRecord) {
    println!("  {} Task {}", "▸".cyan(), task.task_id.dimmed());
    println!("    Status:   {}", colorize_status(&task.status));
    if let Some(progress) = &task.progress {
        println!("    Progress: {}", progress);
    }
    if let Some(created_at) = &task.created_at {
        println!("    Created:  {}", created_at.dimmed());
    }
    if let Some(updated_at) = &task.updated_at {
        println!("    Updated:  {}", updated_at.dimmed());
    }
    println!();
}
