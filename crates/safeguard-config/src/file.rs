//! On-disk configuration schema.
//!
//! `ConfigFile` is deserialized straight from TOML. It is not validated;
//! `SafeguardConfig::from_toml_str` turns it into checked runtime values.
//!
//! Example:
//! ```toml
//! [supervisor]
//! max_failures = 3
//! auto_resume = true
//!
//! [engine]
//! program = "python"
//! args = ["engine.py"]
//! timeout_secs = 1800
//!
//! [storage]
//! state_path = "state/supervisor_state.json"
//!
//! [schedule]
//! kind = "daily"
//! at = "14:00"
//! weekdays = ["mon", "wed", "fri"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use safeguard_contracts::config::{DEFAULT_MAX_FAILURES, DEFAULT_TIMEOUT_SECS};

/// The top-level structure of a SafeGuard TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub supervisor: SupervisorSection,
    pub engine: EngineSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

/// `[supervisor]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorSection {
    /// Consecutive failures that trip SAFE STATE. Must be at least 1.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Probe the engine once per cycle while in SAFE STATE.
    #[serde(default = "default_auto_resume")]
    pub auto_resume: bool,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self { max_failures: default_max_failures(), auto_resume: default_auto_resume() }
    }
}

/// `[engine]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Relative paths resolve against the config file's directory.
    pub cwd: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub slow_run_warn_secs: Option<u64>,
    /// Exit codes that mean "succeeded with degraded output".
    #[serde(default)]
    pub warning_exit_codes: Vec<i32>,
    /// Files the engine must leave behind. Relative paths resolve against `cwd`.
    #[serde(default)]
    pub expected_artifacts: Vec<PathBuf>,
}

/// `[storage]`. Relative paths resolve against the config file's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            status_path: default_status_path(),
            journal_path: default_journal_path(),
        }
    }
}

/// `[schedule]`, selected by `kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSection {
    /// No next run is advertised.
    #[default]
    None,
    /// Every `minutes` after the last run.
    Interval { minutes: u64 },
    /// At `at` ("HH:MM", UTC), on `weekdays` if given, otherwise every day.
    Daily {
        at: String,
        #[serde(default)]
        weekdays: Vec<String>,
    },
}

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

fn default_auto_resume() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state/supervisor_state.json")
}

fn default_status_path() -> PathBuf {
    PathBuf::from("state/status.json")
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("state/journal.jsonl")
}
