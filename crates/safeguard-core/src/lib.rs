//! # safeguard-core
//!
//! The failure-tracking runtime for SafeGuard.
//!
//! This crate provides:
//! - The trait seams (`Engine`, `StateStore`, `StatusSink`, `CycleJournal`,
//!   `SchedulePolicy`, `Clock`)
//! - The `Supervisor` state machine (NORMAL / SAFE_BLOCKED)
//! - Traffic-light derivation
//! - The `CycleRunner` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use safeguard_core::{CycleRunner, Supervisor};
//!
//! let runner = CycleRunner::new(Supervisor::new(config), engine, store, journal, status);
//! let report = runner.run_cycle()?;
//! std::process::exit(report.outcome.exit_code());
//! ```

pub mod cycle;
pub mod status;
pub mod supervisor;
pub mod traits;

pub use cycle::CycleRunner;
pub use status::{derive_status, traffic_light};
pub use supervisor::Supervisor;
