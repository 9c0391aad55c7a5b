//! What one engine invocation reports back.
//!
//! The engine adapter never returns `Err`: launching, crashing, hanging and
//! exiting nonzero are all folded into an `EngineReport` so the supervisor
//! can count them. `FailureKind` keeps them apart for logs and the journal.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why an invocation counts as a FAILURE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The process could not be started at all (missing binary, bad cwd, ...).
    LaunchFailed,
    /// The process exited with a code that is neither 0 nor a warning code.
    NonZeroExit { code: i32 },
    /// The process was terminated by a signal (includes external cancellation).
    Terminated,
    /// The process exceeded its timeout and was killed.
    TimedOut { after_secs: u64 },
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::LaunchFailed => f.write_str("launch_failed"),
            FailureKind::NonZeroExit { code } => write!(f, "exit_code={}", code),
            FailureKind::Terminated => f.write_str("terminated"),
            FailureKind::TimedOut { after_secs } => write!(f, "timed_out_after={}s", after_secs),
        }
    }
}

/// A failed invocation with its cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFailure {
    pub kind: FailureKind,
    /// Free-form detail (OS error text, exit status, ...).
    pub detail: String,
}

impl EngineFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }
}

/// Binary success/failure of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineResult {
    Success,
    Failure(EngineFailure),
}

/// Result of exactly one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReport {
    pub result: EngineResult,
    /// A non-fatal anomaly observed alongside the result.
    pub warning: Option<String>,
    /// Wall-clock duration of the invocation.
    pub elapsed: Duration,
}

impl EngineReport {
    pub fn success() -> Self {
        Self { result: EngineResult::Success, warning: None, elapsed: Duration::ZERO }
    }

    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            result: EngineResult::Failure(EngineFailure::new(kind, detail)),
            warning: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, EngineResult::Success)
    }

    /// The failure, if this invocation failed.
    pub fn failure_ref(&self) -> Option<&EngineFailure> {
        match &self.result {
            EngineResult::Success => None,
            EngineResult::Failure(f) => Some(f),
        }
    }
}
