//! # safeguard-config
//!
//! TOML configuration for the SafeGuard supervisor.
//!
//! ## Overview
//!
//! [`SafeguardConfig`] is loaded once from a TOML file, validated, and then
//! handed out as immutable values: the `SupervisorConfig` for the core, the
//! `StoragePaths` for the store and journal, and a [`Schedule`] implementing
//! [`SchedulePolicy`](safeguard_core::traits::SchedulePolicy).
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use safeguard_config::SafeguardConfig;
//!
//! let config = SafeguardConfig::from_file(Path::new("config/safeguard.toml"))?;
//! let supervisor = safeguard_core::Supervisor::new(config.supervisor.clone());
//! ```

pub mod file;
pub mod loader;
pub mod schedule;

pub use file::ConfigFile;
pub use loader::{SafeguardConfig, StoragePaths};
pub use schedule::{DailySchedule, IntervalSchedule, Schedule};

// ── Tests ─────────────────────────────────────────────────────────────────────
