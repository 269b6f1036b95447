//! OOTD task poller
//!
//! Watches long-running style analysis tasks on the OOTD backend until they
//! complete, fail, time out or are cancelled.
//!
//! Architecture:
//! - Configuration: per-kind polling policies, from defaults or environment
//! - Source: where task status comes from ([`TaskStatusSource`])
//! - Scheduler: poll sessions and the [`Poller`] that owns them
//! - Context: application-wide client plus page-scoped pollers
//!
//! A completed primary analysis that reports an avatar still being generated
//! automatically gets an avatar session of its own.

pub mod config;
pub mod context;
pub mod error;
pub mod scheduler;
pub mod source;

pub use config::{PollPolicy, PollerConfig};
pub use context::{AppContext, PageScope};
pub use error::PollError;
pub use scheduler::{PollEvents, Poller};
pub use source::TaskStatusSource;
