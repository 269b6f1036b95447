//! Poll session driver
//!
//! One tokio task per session. The task owns the interval timer and the set
//! of in-flight status requests; every state transition goes through the
//! session's [`SessionHandle`], which refuses to change a session that has
//! already ended.

use anyhow::{Result, anyhow};
use futures::StreamExt;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::FuturesUnordered;
use ootd_core::domain::session::{PollEvent, PollOutcome, PollSession};
use ootd_core::domain::task::{TaskKind, TaskStatus};
use ootd_core::dto::task::TaskStatusResponse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PollPolicy;
use crate::source::TaskStatusSource;

type StatusFuture = BoxFuture<'static, (u32, Result<TaskStatusResponse>)>;

/// What applying a status response did to the session
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Applied {
    /// Session is still polling
    Continue,
    /// Session ended with this outcome
    Finished(PollOutcome),
    /// Response ignored: session already ended or a newer response was applied
    Discarded,
}

struct SessionState {
    session: PollSession,
    /// Highest attempt whose response has been applied
    latest_applied: u32,
}

/// Shared handle to one poll session
pub(crate) struct SessionHandle {
    session_id: Uuid,
    state: Mutex<SessionState>,
    token: CancellationToken,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        session: PollSession,
        token: CancellationToken,
        events: mpsc::UnboundedSender<PollEvent>,
    ) -> Self {
        Self {
            session_id: session.session_id,
            state: Mutex::new(SessionState {
                session,
                latest_applied: 0,
            }),
            token,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PollEvent) {
        // Receiver gone means the page is gone; nothing left to notify.
        let _ = self.events.send(event);
    }

    pub(crate) fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub(crate) fn snapshot(&self) -> PollSession {
        self.lock().session.clone()
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.lock().session.is_terminal()
    }

    pub(crate) fn announce(&self) {
        let state = self.lock();
        self.emit(PollEvent::Started {
            session_id: self.session_id,
            kind: state.session.kind,
            task_id: state.session.task_id.clone(),
            max_attempts: state.session.max_attempts,
        });
    }

    /// Counts a new tick, returning its attempt number
    fn begin_attempt(&self) -> Option<u32> {
        self.lock().session.begin_attempt()
    }

    fn budget_exhausted(&self) -> bool {
        self.lock().session.budget_exhausted()
    }

    /// Ends the session with `outcome`
    ///
    /// The timer is stopped before the state changes and before the event
    /// goes out. Returns false if the session had already ended.
    pub(crate) fn finish(&self, outcome: PollOutcome) -> bool {
        let mut state = self.lock();
        self.finish_locked(&mut state, outcome)
    }

    fn finish_locked(&self, state: &mut SessionState, outcome: PollOutcome) -> bool {
        if state.session.is_terminal() {
            return false;
        }

        self.token.cancel();
        state.session.finish(&outcome);

        self.emit(PollEvent::Terminal {
            session_id: self.session_id,
            kind: state.session.kind,
            task_id: state.session.task_id.clone(),
            attempt: state.session.attempt,
            outcome,
        });
        true
    }

    /// Applies the response of status check `attempt`
    pub(crate) fn apply(&self, attempt: u32, result: Result<TaskStatusResponse>) -> Applied {
        let mut state = self.lock();

        if state.session.is_terminal() || attempt < state.latest_applied {
            return Applied::Discarded;
        }
        state.latest_applied = attempt;

        let kind = state.session.kind;
        let last_attempt = attempt >= state.session.max_attempts;

        let outcome = match result {
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    %kind,
                    attempt,
                    "Status check failed, retrying next tick: {:#}",
                    e
                );
                None
            }
            Ok(response) if !response.success || response.status == TaskStatus::Error => {
                Some(PollOutcome::Failed {
                    message: response.failure_message(),
                })
            }
            Ok(response) if response.status == TaskStatus::Completed => {
                Some(PollOutcome::Completed {
                    result: response.result,
                })
            }
            Ok(response) => {
                if state
                    .session
                    .record_progress(response.status, response.progress.clone())
                {
                    self.emit(PollEvent::Progress {
                        session_id: self.session_id,
                        kind,
                        task_id: state.session.task_id.clone(),
                        attempt,
                        status: response.status,
                        progress: state.session.progress.clone(),
                    });
                }
                None
            }
        };

        match outcome {
            Some(outcome) => {
                self.finish_locked(&mut state, outcome.clone());
                Applied::Finished(outcome)
            }
            None if last_attempt => {
                self.finish_locked(&mut state, PollOutcome::TimedOut);
                Applied::Finished(PollOutcome::TimedOut)
            }
            None => Applied::Continue,
        }
    }
}

/// Issues one status check bounded by the policy's request timeout
fn status_check(
    source: Arc<dyn TaskStatusSource>,
    kind: TaskKind,
    task_id: String,
    attempt: u32,
    policy: PollPolicy,
) -> StatusFuture {
    async move {
        let result = match time::timeout(
            policy.request_timeout,
            source.fetch_status(kind, &task_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "status request timed out after {:?}",
                policy.request_timeout
            )),
        };
        (attempt, result)
    }
    .boxed()
}

/// Drives a session until it ends or is cancelled
///
/// The first tick fires immediately. Requests are issued on a fixed
/// schedule whether or not earlier ones have answered; responses are handed
/// to [`SessionHandle::apply`] as they arrive.
///
/// Returns the outcome if this loop ended the session, `None` if it was
/// stopped from outside.
pub(crate) async fn run_session(
    handle: Arc<SessionHandle>,
    source: Arc<dyn TaskStatusSource>,
    policy: PollPolicy,
) -> Option<PollOutcome> {
    let snapshot = handle.snapshot();
    let kind = snapshot.kind;
    let task_id = snapshot.task_id;

    let mut ticker = time::interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: FuturesUnordered<StatusFuture> = FuturesUnordered::new();

    loop {
        let ticks_left = !handle.budget_exhausted();

        tokio::select! {
            biased;

            _ = handle.token.cancelled() => {
                debug!(session_id = %handle.session_id(), %kind, "Session stopped");
                return None;
            }

            Some((attempt, result)) = in_flight.next(), if !in_flight.is_empty() => {
                match handle.apply(attempt, result) {
                    Applied::Finished(outcome) => return Some(outcome),
                    Applied::Discarded => {
                        debug!(session_id = %handle.session_id(), attempt, "Discarded stale status response");
                    }
                    Applied::Continue => {}
                }
            }

            _ = ticker.tick(), if ticks_left => {
                if let Some(attempt) = handle.begin_attempt() {
                    debug!(
                        session_id = %handle.session_id(),
                        %kind,
                        %task_id,
                        attempt,
                        max_attempts = policy.max_attempts,
                        "Checking task status"
                    );
                    in_flight.push(status_check(
                        Arc::clone(&source),
                        kind,
                        task_id.clone(),
                        attempt,
                        policy,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handle(max_attempts: u32) -> (SessionHandle, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = PollSession::new(
            "task-1",
            TaskKind::Primary,
            Duration::from_secs(5),
            max_attempts,
        );
        (SessionHandle::new(session, CancellationToken::new(), tx), rx)
    }

    fn running(progress: &str) -> Result<TaskStatusResponse> {
        Ok(TaskStatusResponse::in_progress(TaskStatus::Running, progress))
    }

    #[test]
    fn test_progress_emitted_only_on_change() {
        let (handle, mut rx) = handle(10);
        assert_eq!(handle.begin_attempt(), Some(1));
        assert_eq!(handle.apply(1, running("step 1")), Applied::Continue);
        assert_eq!(handle.begin_attempt(), Some(2));
        assert_eq!(handle.apply(2, running("step 1")), Applied::Continue);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, PollEvent::Progress { attempt: 1, .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stale_response_discarded() {
        let (handle, _rx) = handle(10);
        handle.begin_attempt();
        handle.begin_attempt();

        assert_eq!(handle.apply(2, running("newer")), Applied::Continue);
        assert_eq!(
            handle.apply(1, Ok(TaskStatusResponse::completed(serde_json::json!({})))),
            Applied::Discarded
        );
        assert!(!handle.is_terminal());
        assert_eq!(handle.snapshot().progress.as_deref(), Some("newer"));
    }

    #[test]
    fn test_error_status_fails_session() {
        let (handle, mut rx) = handle(10);
        handle.begin_attempt();

        let applied = handle.apply(1, Ok(TaskStatusResponse::failed("X")));
        assert_eq!(
            applied,
            Applied::Finished(PollOutcome::Failed {
                message: "X".to_string()
            })
        );
        assert!(handle.token.is_cancelled());
        assert!(matches!(rx.try_recv().unwrap(), PollEvent::Terminal { attempt: 1, .. }));
    }

    #[test]
    fn test_unsuccessful_response_fails_session() {
        let (handle, _rx) = handle(10);
        handle.begin_attempt();

        let mut response = TaskStatusResponse::in_progress(TaskStatus::Running, "x");
        response.success = false;
        response.message = Some("rejected".to_string());

        assert_eq!(
            handle.apply(1, Ok(response)),
            Applied::Finished(PollOutcome::Failed {
                message: "rejected".to_string()
            })
        );
    }

    #[test]
    fn test_transport_error_on_last_attempt_times_out() {
        let (handle, _rx) = handle(2);
        handle.begin_attempt();
        assert_eq!(handle.apply(1, Err(anyhow!("connection reset"))), Applied::Continue);

        handle.begin_attempt();
        assert_eq!(
            handle.apply(2, Err(anyhow!("connection reset"))),
            Applied::Finished(PollOutcome::TimedOut)
        );
        assert_eq!(handle.snapshot().attempt, 2);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (handle, mut rx) = handle(3);
        assert!(handle.finish(PollOutcome::Cancelled));
        assert!(!handle.finish(PollOutcome::TimedOut));
        assert_eq!(handle.apply(1, running("late")), Applied::Discarded);

        assert!(matches!(
            rx.try_recv().unwrap(),
            PollEvent::Terminal {
                outcome: PollOutcome::Cancelled,
                ..
            }
        ));
        assert!(rx.try_recv().is_err());
    }
}
