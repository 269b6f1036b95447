//! Core domain types
//!
//! These types describe backend tasks and the client-side sessions that
//! track them. They are shared between the HTTP client (which decodes
//! statuses) and the poller (which drives sessions).

pub mod session;
pub mod task;
