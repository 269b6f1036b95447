//! OOTD Core
//!
//! Core types shared by the OOTD style-analysis client crates.
//!
//! This crate contains:
//! - Domain types: tasks, poll sessions, poll outcomes and events
//! - DTOs: request/response bodies exchanged with the backend

pub mod domain;
pub mod dto;
