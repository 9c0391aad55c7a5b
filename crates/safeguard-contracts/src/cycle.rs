//! Per-cycle decisions, outcomes, and journal records.
//!
//! `CycleReport` is what the cycle runner hands back to the caller.
//! `CycleRecord` is what gets appended to the journal, one per cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{EngineReport, FailureKind},
    state::{RunOutcome, SupervisorState},
    status::StatusRecord,
};

/// Unique identifier for one supervised cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub uuid::Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether the engine may run this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Not in SAFE STATE: ordinary invocation.
    Run,
    /// In SAFE STATE with auto-resume: one trial invocation.
    Probe,
    /// In SAFE STATE without auto-resume: the engine is not invoked.
    Block,
}

impl Decision {
    pub fn invokes_engine(self) -> bool {
        !matches!(self, Decision::Block)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Run => "run",
            Decision::Probe => "probe",
            Decision::Block => "block",
        };
        f.write_str(s)
    }
}

/// What the external trigger is told about a completed cycle.
///
/// Hard errors are not a variant: they surface as `Err(SafeguardError)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleOutcome {
    RanSuccess,
    RanFailure,
    Blocked,
}

impl CycleOutcome {
    /// Process exit code for the trigger. `1` is reserved for hard errors.
    pub fn exit_code(self) -> i32 {
        match self {
            CycleOutcome::RanSuccess => 0,
            CycleOutcome::RanFailure => 2,
            CycleOutcome::Blocked => 3,
        }
    }

    pub fn run_outcome(self) -> RunOutcome {
        match self {
            CycleOutcome::RanSuccess => RunOutcome::Success,
            CycleOutcome::RanFailure => RunOutcome::Failure,
            CycleOutcome::Blocked => RunOutcome::Blocked,
        }
    }
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CycleOutcome::RanSuccess => "ran-success",
            CycleOutcome::RanFailure => "ran-failure",
            CycleOutcome::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// The result of one supervisor evaluation, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub outcome: CycleOutcome,
    pub state: SupervisorState,
    /// Present whenever the engine was invoked.
    pub engine: Option<EngineReport>,
}

/// Returned by the cycle runner once state, journal and status are durable.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub decision: Decision,
    pub outcome: CycleOutcome,
    pub state: SupervisorState,
    pub status: StatusRecord,
    pub engine: Option<EngineReport>,
}

/// An immutable journal entry describing one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub decision: Decision,
    pub outcome: CycleOutcome,
    /// Failure cause when the engine ran and failed.
    pub failure_kind: Option<FailureKind>,
    pub failure_detail: Option<String>,
    pub warning: Option<String>,
    /// Counters after this cycle.
    pub consecutive_failures: u32,
    pub safe_state: bool,
    pub warnings: u64,
}
