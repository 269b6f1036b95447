//! Health command handler

use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

/// Handle the health command
pub async fn handle_health_command(config: &Config) -> Result<()> {
    let ctx = config.app_context()?;
    let health = match ctx.client().health().await {
        Ok(health) => health,
        Err(e) if e.is_transport() => {
            return Err(e)
                .with_context(|| format!("Backend at {} is unreachable", config.backend_url));
        }
        Err(e) => return Err(e).context("Health check failed"),
    };

    let status = if health.status == "healthy" {
        health.status.green()
    } else {
        health.status.yellow()
    };
    println!("{} {}", "Backend:".bold(), config.backend_url);
    println!("  Status:   {}", status);
    if let Some(service) = &health.service {
        println!("  Service:  {}", service.dimmed());
    }

    Ok(())
}
