//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod analyze;
mod health;
mod tasks;
mod watch;

pub use analyze::AnalyzeArgs;
pub use tasks::TaskCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use ootd_core::domain::task::TaskStatus;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a style analysis and follow it to the end
    Analyze(AnalyzeArgs),
    /// Follow an existing task
    Watch {
        /// Task id returned at submission
        task_id: String,

        /// The id is an avatar generation task
        #[arg(long)]
        avatar: bool,
    },
    /// Backend task management
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Check backend health
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Analyze(args) => analyze::handle_analyze_command(args, config).await,
        Commands::Watch { task_id, avatar } => {
            watch::handle_watch_command(&task_id, avatar, config).await
        }
        Commands::Tasks { command } => tasks::handle_task_command(command, config).await,
        Commands::Health => health::handle_health_command(config).await,
    }
}

/// Colorize task status for display
pub(crate) fn colorize_status(status: &TaskStatus) -> colored::ColoredString {
    let status_str = status.to_string();
    match status {
        TaskStatus::Pending => status_str.yellow(),
        TaskStatus::Running => status_str.blue(),
        TaskStatus::Completed => status_str.green(),
        TaskStatus::Error => status_str.red(),
    }
}
