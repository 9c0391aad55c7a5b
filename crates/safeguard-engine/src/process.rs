//! Subprocess implementation of `Engine`.
//!
//! Classification of one run:
//!
//! | observed                              | result                         |
//! |---------------------------------------|--------------------------------|
//! | spawn error                           | FAILURE `LaunchFailed`         |
//! | still running at `timeout_secs`       | FAILURE `TimedOut`, child killed |
//! | killed by a signal                    | FAILURE `Terminated`           |
//! | exit code in `warning_exit_codes`     | SUCCESS + warning              |
//! | any other nonzero exit code           | FAILURE `NonZeroExit`          |
//! | exit 0                                | SUCCESS                        |
//!
//! Any run that exited (normally or by signal) picks up a warning when it
//! ran longer than `slow_run_warn_secs`; a FAILURE keeps its warning. A
//! SUCCESS also picks one up when it left any `expected_artifacts` missing.
//! Several anomalies in one run still make one warning.

use std::{
    path::PathBuf,
    process::{Child, Command, ExitStatus},
    thread,
    time::{Duration, Instant},
};

use tracing::{error, info, warn};

use safeguard_contracts::{
    config::EngineInvocation,
    engine::{EngineReport, FailureKind},
};
use safeguard_core::traits::Engine;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the configured command once per `invoke()`.
///
/// stdout and stderr are inherited so the engine's own output lands
/// wherever the supervisor's does.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    invocation: EngineInvocation,
    poll_interval: Duration,
}

impl ProcessEngine {
    pub fn new(invocation: EngineInvocation) -> Self {
        Self { invocation, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// How often a running child is checked for exit and timeout.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.invocation.program);
        cmd.args(&self.invocation.args);
        if let Some(cwd) = &self.invocation.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn run(&self, started: Instant) -> EngineReport {
        let command_line = self.invocation.display();
        info!(command = %command_line, timeout_secs = self.invocation.timeout_secs, "launching engine");

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(command = %command_line, failure_kind = "launch_failed", error = %e, "engine could not be launched");
                return EngineReport::failure(FailureKind::LaunchFailed, format!("{}: {}", command_line, e));
            }
        };

        match self.wait_with_timeout(&mut child, started) {
            Ok(Some(status)) => self.classify(status, started.elapsed()),
            Ok(None) => {
                let after_secs = self.invocation.timeout_secs;
                error!(command = %command_line, failure_kind = "timed_out", after_secs, "engine timed out and was killed");
                EngineReport::failure(FailureKind::TimedOut { after_secs }, format!("killed after {}s", after_secs))
            }
            Err(e) => {
                error!(command = %command_line, failure_kind = "terminated", error = %e, "lost track of engine process");
                EngineReport::failure(FailureKind::Terminated, format!("wait failed: {}", e))
            }
        }
    }

    /// `Ok(None)` means the timeout expired and the child was killed.
    fn wait_with_timeout(&self, child: &mut Child, started: Instant) -> std::io::Result<Option<ExitStatus>> {
        let timeout = Duration::from_secs(self.invocation.timeout_secs);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                // Already exited between the poll and the kill is fine: wait() reaps it.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(self.poll_interval.min(timeout - elapsed));
        }
    }

    fn classify(&self, status: ExitStatus, elapsed: Duration) -> EngineReport {
        let command_line = self.invocation.display();
        let mut warnings = Vec::new();

        let failure = match status.code() {
            Some(0) => None,
            Some(code) if self.invocation.warning_exit_codes.contains(&code) => {
                warn!(command = %command_line, exit_code = code, "engine finished with a warning exit code");
                warnings.push(format!("exit code {} (degraded output)", code));
                None
            }
            Some(code) => {
                error!(command = %command_line, failure_kind = "nonzero_exit", exit_code = code, "engine exited nonzero");
                Some(FailureKind::NonZeroExit { code })
            }
            None => {
                error!(command = %command_line, failure_kind = "terminated", status = %status, "engine was terminated");
                Some(FailureKind::Terminated)
            }
        };

        if let Some(limit) = self.invocation.slow_run_warn_secs {
            if elapsed > Duration::from_secs(limit) {
                warn!(command = %command_line, elapsed_ms = elapsed.as_millis() as u64, limit_secs = limit, "engine run was slow");
                warnings.push(format!("slow run: {:.1}s > {}s", elapsed.as_secs_f64(), limit));
            }
        }

        // Artifacts are only expected from a run that claims success.
        let report = match failure {
            Some(kind) => EngineReport::failure(kind, status.to_string()),
            None => {
                let missing = self.missing_artifacts();
                if !missing.is_empty() {
                    let list = missing.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ");
                    warn!(command = %command_line, missing = %list, "engine left expected artifacts missing");
                    warnings.push(format!("missing artifacts: {}", list));
                }
                info!(command = %command_line, elapsed_ms = elapsed.as_millis() as u64, "engine succeeded");
                EngineReport::success()
            }
        };

        if warnings.is_empty() {
            report
        } else {
            report.with_warning(warnings.join("; "))
        }
    }

    /// Expected artifacts that do not exist. Relative paths resolve against `cwd`.
    fn missing_artifacts(&self) -> Vec<PathBuf> {
        self.invocation
            .expected_artifacts
            .iter()
            .map(|p| match &self.invocation.cwd {
                Some(cwd) if p.is_relative() => cwd.join(p),
                _ => p.clone(),
            })
            .filter(|p| !p.exists())
            .collect()
    }
}

impl Engine for ProcessEngine {
    fn invoke(&self) -> EngineReport {
        let started = Instant::now();
        let report = self.run(started);
        report.with_elapsed(started.elapsed())
    }
}
