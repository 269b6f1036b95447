//! Poll session domain types
//!
//! A poll session is the client-side record of one task being watched:
//! how many status checks have been made, what the last reported progress
//! was and how the session ended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::task::{TaskKind, TaskStatus};

/// Lifecycle state of a poll session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    Idle,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Idle | PollState::Polling)
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollState::Idle => write!(f, "Idle"),
            PollState::Polling => write!(f, "Polling"),
            PollState::Completed => write!(f, "Completed"),
            PollState::Failed => write!(f, "Failed"),
            PollState::TimedOut => write!(f, "TimedOut"),
            PollState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// How a poll session ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PollOutcome {
    /// Backend reported `completed`; carries the opaque result payload
    Completed { result: Option<JsonValue> },
    /// Backend reported `error`
    Failed { message: String },
    /// Attempt budget exhausted without a terminal status
    TimedOut,
    /// Stopped by the caller or by page teardown
    Cancelled,
}

impl PollOutcome {
    /// The terminal session state this outcome maps to
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Completed { .. } => PollState::Completed,
            PollOutcome::Failed { .. } => PollState::Failed,
            PollOutcome::TimedOut => PollState::TimedOut,
            PollOutcome::Cancelled => PollState::Cancelled,
        }
    }
}

/// Client-side record of one watched task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSession {
    /// Unique per start; distinguishes a session from its replacement
    pub session_id: Uuid,
    pub task_id: String,
    pub kind: TaskKind,
    /// Number of status checks issued so far
    pub attempt: u32,
    pub max_attempts: u32,
    pub interval: Duration,
    pub state: PollState,
    /// Last status the backend reported
    pub last_status: Option<TaskStatus>,
    /// Last progress text the backend reported
    pub progress: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PollSession {
    /// Creates an idle session for a task
    pub fn new(
        task_id: impl Into<String>,
        kind: TaskKind,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            task_id: task_id.into(),
            kind,
            attempt: 0,
            max_attempts,
            interval,
            state: PollState::Idle,
            last_status: None,
            progress: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Returns true when every allowed status check has been issued
    pub fn budget_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Records a newly issued status check
    ///
    /// Returns the attempt number of the check, or `None` if the budget is
    /// already spent or the session has ended.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.is_terminal() || self.budget_exhausted() {
            return None;
        }
        self.state = PollState::Polling;
        self.attempt += 1;
        Some(self.attempt)
    }

    /// Records a non-terminal status report
    ///
    /// Returns true if the visible status or progress text changed.
    pub fn record_progress(&mut self, status: TaskStatus, progress: Option<String>) -> bool {
        let changed = self.last_status != Some(status)
            || (progress.is_some() && self.progress != progress);
        self.last_status = Some(status);
        if progress.is_some() {
            self.progress = progress;
        }
        changed
    }

    /// Moves the session into the terminal state matching `outcome`
    pub fn finish(&mut self, outcome: &PollOutcome) {
        self.state = outcome.state();
        self.finished_at = Some(Utc::now());
    }
}

/// Notification emitted by the poller towards the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PollEvent {
    /// A session was registered and its first status check is due
    Started {
        session_id: Uuid,
        kind: TaskKind,
        task_id: String,
        max_attempts: u32,
    },
    /// Progress or status changed on a live session
    Progress {
        session_id: Uuid,
        kind: TaskKind,
        task_id: String,
        attempt: u32,
        status: TaskStatus,
        progress: Option<String>,
    },
    /// A session reached a terminal state
    Terminal {
        session_id: Uuid,
        kind: TaskKind,
        task_id: String,
        attempt: u32,
        outcome: PollOutcome,
    },
}

impl PollEvent {
    pub fn kind(&self) -> TaskKind {
        match self {
            PollEvent::Started { kind, .. }
            | PollEvent::Progress { kind, .. }
            | PollEvent::Terminal { kind, .. } => *kind,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            PollEvent::Started { session_id, .. }
            | PollEvent::Progress { session_id, .. }
            | PollEvent::Terminal { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max_attempts: u32) -> PollSession {
        PollSession::new("task-1", TaskKind::Primary, Duration::from_secs(5), max_attempts)
    }

    #[test]
    fn test_attempts_stop_at_budget() {
        let mut session = session(2);
        assert_eq!(session.state, PollState::Idle);

        assert_eq!(session.begin_attempt(), Some(1));
        assert_eq!(session.state, PollState::Polling);
        assert_eq!(session.begin_attempt(), Some(2));
        assert!(session.budget_exhausted());
        assert_eq!(session.begin_attempt(), None);
        assert_eq!(session.attempt, 2);
    }

    #[test]
    fn test_no_attempts_after_finish() {
        let mut session = session(5);
        session.begin_attempt();
        session.finish(&PollOutcome::Cancelled);

        assert!(session.is_terminal());
        assert_eq!(session.state, PollState::Cancelled);
        assert!(session.finished_at.is_some());
        assert_eq!(session.begin_attempt(), None);
    }

    #[test]
    fn test_record_progress_reports_changes() {
        let mut session = session(5);

        assert!(session.record_progress(TaskStatus::Pending, Some("queued".to_string())));
        assert!(!session.record_progress(TaskStatus::Pending, Some("queued".to_string())));
        assert!(!session.record_progress(TaskStatus::Pending, None));
        assert_eq!(session.progress.as_deref(), Some("queued"));

        assert!(session.record_progress(TaskStatus::Running, None));
        assert!(session.record_progress(TaskStatus::Running, Some("analyzing".to_string())));
    }

    #[test]
    fn test_outcome_states() {
        assert_eq!(PollOutcome::Completed { result: None }.state(), PollState::Completed);
        assert_eq!(
            PollOutcome::Failed { message: "x".to_string() }.state(),
            PollState::Failed
        );
        assert_eq!(PollOutcome::TimedOut.state(), PollState::TimedOut);
        assert_eq!(PollOutcome::Cancelled.state(), PollState::Cancelled);
        assert!(!PollState::Polling.is_terminal());
    }
}
