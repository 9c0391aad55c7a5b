//! Immutable per-run supervisor configuration.
//!
//! Built once by the hosting binary (usually from TOML, see
//! `safeguard-config`) and passed by reference into the supervisor. Nothing
//! in the runtime mutates it.

use std::num::NonZeroU32;
use std::path::PathBuf;

/// Default consecutive-failure threshold.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Default engine timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// How to launch the external engine.
///
/// The supervisor treats this as opaque; only the engine adapter reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    /// Executable to launch (e.g. "python").
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Working directory; inherits the supervisor's when absent.
    pub cwd: Option<PathBuf>,
    /// Hard wall-clock limit. The engine is killed and the run is a FAILURE.
    pub timeout_secs: u64,
    /// Runs slower than this succeed but raise a warning.
    pub slow_run_warn_secs: Option<u64>,
    /// Exit codes that mean "succeeded with degraded output".
    pub warning_exit_codes: Vec<i32>,
    /// Files that a successful run is expected to leave behind.
    ///
    /// Only existence is checked; contents are never interpreted.
    pub expected_artifacts: Vec<PathBuf>,
}

impl EngineInvocation {
    /// An invocation of `program` with defaults for everything else.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            slow_run_warn_secs: None,
            warning_exit_codes: Vec::new(),
            expected_artifacts: Vec::new(),
        }
    }

    /// Append arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Thresholds and resume policy for one supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// The engine this supervisor wraps.
    pub engine_invocation: EngineInvocation,
    /// Reaching this many consecutive failures trips SAFE STATE.
    pub max_failures: NonZeroU32,
    /// While in SAFE STATE, invoke the engine once per cycle to test recovery.
    pub auto_resume: bool,
}

impl SupervisorConfig {
    /// A config with the default threshold and auto-resume enabled.
    pub fn new(engine_invocation: EngineInvocation) -> Self {
        Self {
            engine_invocation,
            max_failures: NonZeroU32::new(DEFAULT_MAX_FAILURES).unwrap_or(NonZeroU32::MIN),
            auto_resume: true,
        }
    }

    pub fn with_max_failures(mut self, max_failures: NonZeroU32) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn with_auto_resume(mut self, auto_resume: bool) -> Self {
        self.auto_resume = auto_resume;
        self
    }
}
