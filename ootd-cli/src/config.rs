//! Configuration module
//!
//! Handles CLI configuration: backend URL, auth token and the poller
//! settings derived from them.

use anyhow::Result;
use ootd_poller::{AppContext, PollerConfig};
use std::sync::Arc;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the OOTD backend
    pub backend_url: String,

    /// Bearer token for authenticated backends
    pub auth_token: Option<String>,
}

impl Config {
    /// Poller settings: default policies, overridable from the environment
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new(&self.backend_url).with_env_overrides()
    }

    /// Builds the application context for this invocation
    pub fn app_context(&self) -> Result<Arc<AppContext>> {
        AppContext::new(self.poller_config(), self.auth_token.clone())
    }
}
