//! # safeguard-contracts
//!
//! Shared types, persisted records, and errors for the SafeGuard supervisor.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod state;
pub mod status;
