//! Poller error types
//!
//! Session outcomes are never errors; these only cover misuse of the
//! poller API itself.

use ootd_core::domain::task::TaskKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("task_id cannot be empty")]
    EmptyTaskId,

    /// Policy would tick continuously
    #[error("{kind} poll interval must be greater than 0")]
    ZeroInterval { kind: TaskKind },

    /// The owning page has been torn down
    #[error("poller has been shut down")]
    ShutDown,
}
