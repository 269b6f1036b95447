//! OOTD CLI
//!
//! Command-line client for the OOTD style analysis backend: submits
//! analyses, follows them to completion and manages backend tasks.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ootd")]
#[command(about = "OOTD style analysis CLI", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(long, env = "OOTD_BACKEND_URL", default_value = "http://localhost:8000")]
    backend_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "OOTD_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ootd_cli=info,ootd_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        backend_url: cli.backend_url,
        auth_token: cli.token,
    };

    handle_command(cli.command, &config).await
}
