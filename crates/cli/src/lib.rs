//! # eventfan
//!
//! Server orchestration and CLI wiring. The library surface exposes
//! [`server::Server`] so integration tests can drive a full in-process
//! instance on ephemeral ports.

pub mod cli;
pub mod commands;
pub mod server;
pub mod stats;
