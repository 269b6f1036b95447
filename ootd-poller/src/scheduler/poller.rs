//! Task poller
//!
//! Keeps at most one live poll session per task kind and chains the avatar
//! stage onto a completed primary analysis.

use ootd_core::domain::session::{PollEvent, PollOutcome, PollSession};
use ootd_core::domain::task::TaskKind;
use ootd_core::dto::analysis::AnalysisResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PollerConfig;
use crate::error::PollError;
use crate::scheduler::session::{SessionHandle, run_session};
use crate::source::TaskStatusSource;

/// Stream of poll events for the UI layer
pub type PollEvents = mpsc::UnboundedReceiver<PollEvent>;

struct PollerInner {
    source: Arc<dyn TaskStatusSource>,
    config: PollerConfig,
    /// Latest session per kind, live or finished
    sessions: Mutex<HashMap<TaskKind, Arc<SessionHandle>>>,
    events: mpsc::UnboundedSender<PollEvent>,
    /// Parent of every session token; cancelled on shutdown
    shutdown: CancellationToken,
}

/// Poller that watches backend tasks until they settle
///
/// Cloning is cheap and every clone drives the same sessions.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

impl Poller {
    /// Creates a new poller and the event stream it reports to
    pub fn new(source: Arc<dyn TaskStatusSource>, config: PollerConfig) -> (Self, PollEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = PollerInner {
            source,
            config,
            sessions: Mutex::new(HashMap::new()),
            events,
            shutdown: CancellationToken::new(),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Starts watching `task_id` as the `kind` session
    ///
    /// Any previous session of the same kind is cancelled first. The first
    /// status check runs immediately, then one per policy interval. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Returns
    /// The id of the new session
    pub fn start(&self, task_id: &str, kind: TaskKind) -> Result<Uuid, PollError> {
        PollerInner::start(&self.inner, task_id, kind)
    }

    /// Cancels the live session of `kind`, if any
    ///
    /// Idempotent. No tick or response has any effect on the session
    /// after this returns.
    pub fn cancel(&self, kind: TaskKind) {
        if let Some(handle) = self.inner.handle(kind) {
            if handle.finish(PollOutcome::Cancelled) {
                info!(session_id = %handle.session_id(), %kind, "Session cancelled");
            }
        }
    }

    /// Cancels every session and refuses new ones
    ///
    /// Called when the owning page goes away.
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        for kind in TaskKind::ALL {
            self.cancel(kind);
        }
        self.inner.shutdown.cancel();
        debug!("Poller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Snapshot of the latest session of `kind`, live or finished
    pub fn session(&self, kind: TaskKind) -> Option<PollSession> {
        self.inner.handle(kind).map(|handle| handle.snapshot())
    }

    /// Returns true if a session of `kind` is still polling
    pub fn is_active(&self, kind: TaskKind) -> bool {
        self.inner
            .handle(kind)
            .is_some_and(|handle| !handle.is_terminal())
    }

    /// Token cancelled once the poller shuts down
    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }
}

impl PollerInner {
    fn registry(&self) -> MutexGuard<'_, HashMap<TaskKind, Arc<SessionHandle>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, kind: TaskKind) -> Option<Arc<SessionHandle>> {
        self.registry().get(&kind).cloned()
    }

    fn start(inner: &Arc<Self>, task_id: &str, kind: TaskKind) -> Result<Uuid, PollError> {
        if task_id.trim().is_empty() {
            return Err(PollError::EmptyTaskId);
        }
        if inner.shutdown.is_cancelled() {
            return Err(PollError::ShutDown);
        }

        let policy = inner.config.policy(kind);
        if policy.interval.is_zero() {
            return Err(PollError::ZeroInterval { kind });
        }

        let session = PollSession::new(task_id, kind, policy.interval, policy.max_attempts);
        let handle = Arc::new(SessionHandle::new(
            session,
            inner.shutdown.child_token(),
            inner.events.clone(),
        ));
        let session_id = handle.session_id();

        {
            let mut sessions = inner.registry();
            if let Some(previous) = sessions.insert(kind, Arc::clone(&handle)) {
                if previous.finish(PollOutcome::Cancelled) {
                    info!(
                        session_id = %previous.session_id(),
                        %kind,
                        "Session replaced by a new one"
                    );
                }
            }
            handle.announce();
        }

        if policy.max_attempts == 0 {
            handle.finish(PollOutcome::TimedOut);
            warn!(%session_id, %kind, task_id, "No status checks allowed, session timed out");
            return Ok(session_id);
        }

        info!(
            %session_id,
            %kind,
            task_id,
            interval = ?policy.interval,
            max_attempts = policy.max_attempts,
            "Polling task"
        );

        let task_inner = Arc::clone(inner);
        let source = Arc::clone(&inner.source);
        tokio::spawn(async move {
            if let Some(outcome) = run_session(Arc::clone(&handle), source, policy).await {
                task_inner.on_terminal(kind, &handle, outcome);
            }
        });

        Ok(session_id)
    }

    /// Follow-up once a session ended on its own
    ///
    /// The session's timer is already stopped and its terminal event sent.
    fn on_terminal(self: &Arc<Self>, kind: TaskKind, handle: &SessionHandle, outcome: PollOutcome) {
        let session = handle.snapshot();
        info!(
            session_id = %session.session_id,
            %kind,
            task_id = %session.task_id,
            attempts = session.attempt,
            state = %session.state,
            "Session finished"
        );

        if kind != TaskKind::Primary {
            return;
        }

        let PollOutcome::Completed {
            result: Some(result),
        } = outcome
        else {
            return;
        };

        let avatar_task = match AnalysisResult::from_value(&result) {
            Ok(analysis) => analysis.pending_avatar_task().map(str::to_string),
            Err(e) => {
                debug!("Completed result is not an analysis payload: {}", e);
                None
            }
        };

        if let Some(avatar_task_id) = avatar_task {
            info!(%avatar_task_id, "Avatar generation in progress, starting avatar session");
            if let Err(e) = Self::start(self, &avatar_task_id, TaskKind::Avatar) {
                warn!("Failed to start avatar session: {}", e);
                self.report_unstarted(TaskKind::Avatar, &avatar_task_id, &e);
            }
        }
    }

    /// Emits a terminal event for a session that could not be started
    ///
    /// Listeners waiting on the announced task still get an outcome.
    fn report_unstarted(&self, kind: TaskKind, task_id: &str, err: &PollError) {
        let outcome = match err {
            PollError::ShutDown => PollOutcome::Cancelled,
            other => PollOutcome::Failed {
                message: other.to_string(),
            },
        };
        let _ = self.events.send(PollEvent::Terminal {
            session_id: Uuid::new_v4(),
            kind,
            task_id: task_id.to_string(),
            attempt: 0,
            outcome,
        });
    }
}
