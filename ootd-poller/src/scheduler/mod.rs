//! Scheduler layer for the poller
//!
//! Owns the poll sessions: one timer-driven tokio task per watched backend
//! task, at most one live session per task kind.

pub mod poller;
pub(crate) mod session;

pub use poller::{PollEvents, Poller};
