//! Shared types for peerbeacon crates: configuration, the error taxonomy and
//! structured trace events.

pub mod config;
pub mod error;
pub mod trace;
