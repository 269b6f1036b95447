//! Data Transfer Objects for backend communication
//!
//! Wire-level request and response bodies for the style-analysis API.
//! Field names follow the backend's JSON contract.

pub mod analysis;
pub mod task;
