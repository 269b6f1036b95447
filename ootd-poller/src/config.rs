//! Poller configuration
//!
//! Defines the backend connection settings and the per-kind polling
//! policies (interval, attempt budget, per-request timeout).

use ootd_core::domain::task::TaskKind;
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Polling policy for one task kind
///
/// The session ceiling is roughly `interval * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between status checks
    pub interval: Duration,

    /// Number of status checks before the session times out
    pub max_attempts: u32,

    /// Upper bound on a single status request, independent of `interval`
    pub request_timeout: Duration,
}

impl PollPolicy {
    /// Policy for the primary analysis task (about 5 minutes)
    pub fn primary() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Policy for the avatar generation task (2 minutes)
    pub fn avatar() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 40,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Wall-clock span covered by the full attempt budget
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }

    fn validate(&self, kind: TaskKind) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            anyhow::bail!("{} poll interval must be greater than 0", kind);
        }

        if self.max_attempts == 0 {
            anyhow::bail!("{} max_attempts must be greater than 0", kind);
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("{} request timeout must be greater than 0", kind);
        }

        Ok(())
    }
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Backend base URL (e.g., "http://localhost:8000")
    pub backend_url: String,

    pub primary: PollPolicy,

    pub avatar: PollPolicy,
}

impl PollerConfig {
    /// Creates a new configuration with default policies
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            primary: PollPolicy::primary(),
            avatar: PollPolicy::avatar(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - OOTD_BACKEND_URL (required)
    /// - OOTD_PRIMARY_POLL_INTERVAL_MS (optional, default: 5000)
    /// - OOTD_PRIMARY_MAX_ATTEMPTS (optional, default: 60)
    /// - OOTD_AVATAR_POLL_INTERVAL_MS (optional, default: 3000)
    /// - OOTD_AVATAR_MAX_ATTEMPTS (optional, default: 40)
    /// - OOTD_REQUEST_TIMEOUT_MS (optional, default: 10000, both kinds)
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = std::env::var("OOTD_BACKEND_URL")
            .map_err(|_| anyhow::anyhow!("OOTD_BACKEND_URL environment variable not set"))?;

        Ok(Self::new(backend_url).with_env_overrides())
    }

    /// Applies the optional polling variables of [`from_env`](Self::from_env)
    ///
    /// Unset or unparsable variables keep the current value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(interval) = env_millis("OOTD_PRIMARY_POLL_INTERVAL_MS") {
            self.primary.interval = interval;
        }
        if let Some(attempts) = env_u32("OOTD_PRIMARY_MAX_ATTEMPTS") {
            self.primary.max_attempts = attempts;
        }
        if let Some(interval) = env_millis("OOTD_AVATAR_POLL_INTERVAL_MS") {
            self.avatar.interval = interval;
        }
        if let Some(attempts) = env_u32("OOTD_AVATAR_MAX_ATTEMPTS") {
            self.avatar.max_attempts = attempts;
        }
        if let Some(timeout) = env_millis("OOTD_REQUEST_TIMEOUT_MS") {
            self.primary.request_timeout = timeout;
            self.avatar.request_timeout = timeout;
        }
        self
    }

    /// Returns the policy for a task kind
    pub fn policy(&self, kind: TaskKind) -> PollPolicy {
        match kind {
            TaskKind::Primary => self.primary,
            TaskKind::Avatar => self.avatar,
        }
    }

    /// Overrides the policy for a task kind
    pub fn with_policy(mut self, kind: TaskKind, policy: PollPolicy) -> Self {
        match kind {
            TaskKind::Primary => self.primary = policy,
            TaskKind::Avatar => self.avatar = policy,
        }
        self
    }

    /// Longest per-request timeout across kinds
    pub fn max_request_timeout(&self) -> Duration {
        self.primary.request_timeout.max(self.avatar.request_timeout)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url cannot be empty");
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            anyhow::bail!("backend_url must start with http:// or https://");
        }

        for kind in TaskKind::ALL {
            self.policy(kind).validate(kind)?;
        }

        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.parse::<u32>().ok())
}
