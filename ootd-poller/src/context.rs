//! Application and page contexts
//!
//! [`AppContext`] is built once per process and holds what every page
//! shares: the configuration and the backend client. A [`PageScope`] owns
//! the poller for one page; dropping or tearing it down cancels every
//! session it started.

use anyhow::{Context as _, Result};
use ootd_client::BackendClient;
use ootd_core::domain::session::PollEvent;
use std::sync::Arc;
use tracing::debug;

use crate::config::PollerConfig;
use crate::scheduler::{PollEvents, Poller};
use crate::source::TaskStatusSource;

/// Process-wide state shared by every page
pub struct AppContext {
    config: PollerConfig,
    client: Arc<BackendClient>,
}

impl AppContext {
    /// Creates the application context
    ///
    /// # Arguments
    /// * `config` - Poller configuration, validated here
    /// * `auth_token` - Bearer token attached to every backend request
    pub fn new(config: PollerConfig, auth_token: Option<String>) -> Result<Arc<Self>> {
        config.validate().context("Invalid poller configuration")?;

        let mut client =
            BackendClient::with_timeout(&config.backend_url, config.max_request_timeout())
                .context("Failed to build backend client")?;
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            client = client.with_token(token);
        }

        Ok(Arc::new(Self {
            config,
            client: Arc::new(client),
        }))
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Opens a page scope polling through the shared backend client
    pub fn open_page(&self) -> PageScope {
        let source: Arc<dyn TaskStatusSource> = self.client.clone();
        PageScope::new(source, self.config.clone())
    }
}

/// Poller and event stream owned by one page
pub struct PageScope {
    poller: Poller,
    events: PollEvents,
}

impl PageScope {
    pub fn new(source: Arc<dyn TaskStatusSource>, config: PollerConfig) -> Self {
        let (poller, events) = Poller::new(source, config);
        Self { poller, events }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Waits for the next poll event
    ///
    /// Returns `None` once the page has been torn down and every buffered
    /// event has been delivered.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        if !self.poller.is_shut_down() {
            let shutdown = self.poller.shutdown_token();
            tokio::select! {
                biased;

                event = self.events.recv() => return event,
                _ = shutdown.cancelled() => {}
            }
        }
        self.events.try_recv().ok()
    }

    /// Cancels every session of this page
    pub fn teardown(&self) {
        if !self.poller.is_shut_down() {
            debug!("Tearing down page scope");
            self.poller.shutdown();
        }
    }
}

impl Drop for PageScope {
    fn drop(&mut self) {
        self.teardown();
    }
}
