//! Persisted supervisor state.
//!
//! `SupervisorState` is the single source of truth carried from one cycle to
//! the next. Only the supervisor mutates it; the status engine and observers
//! read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written into every state file.
pub const STATE_VERSION: u32 = 1;

/// The recorded result of the most recent cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Success,
    Failure,
    Blocked,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunOutcome::Success => "SUCCESS",
            RunOutcome::Failure => "FAILURE",
            RunOutcome::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

/// The two states of the supervisor's machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorMode {
    Normal,
    SafeBlocked,
}

/// Failure/success bookkeeping persisted across cycles.
///
/// `deny_unknown_fields` makes a state file written by a newer schema fail to
/// load instead of having its extra fields dropped on the next write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorState {
    /// Schema version; see `STATE_VERSION`.
    pub version: u32,
    /// True once tripped; cleared only by a successful run or probe.
    pub safe_state: bool,
    /// Length of the trailing run of failures.
    pub consecutive_failures: u32,
    /// Non-fatal anomalies observed. Never decays inside the supervisor.
    pub warnings: u64,
    /// Outcome of the most recent cycle; absent before the first one.
    pub last_outcome: Option<RunOutcome>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Description of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            safe_state: false,
            consecutive_failures: 0,
            warnings: 0,
            last_outcome: None,
            last_run_at: None,
            last_success_at: None,
            last_failure_at: None,
            last_error: None,
        }
    }
}

impl SupervisorState {
    /// Which state-machine node this record represents.
    pub fn mode(&self) -> SupervisorMode {
        if self.safe_state {
            SupervisorMode::SafeBlocked
        } else {
            SupervisorMode::Normal
        }
    }
}
