//! # safeguard-engine
//!
//! Adapter from an external command to the `Engine` trait.
//!
//! [`ProcessEngine`] never returns an error: every way the command can go
//! wrong becomes an `EngineReport` with a `FailureKind`, and degraded but
//! successful runs carry a warning.

pub mod process;

pub use process::ProcessEngine;

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use safeguard_contracts::{
        config::EngineInvocation,
        engine::{EngineResult, FailureKind},
    };
    use safeguard_core::traits::Engine;

    use crate::ProcessEngine;

    fn sh(script: &str) -> EngineInvocation {
        EngineInvocation::new("sh").with_args(["-c", script])
    }

    fn run(invocation: EngineInvocation) -> safeguard_contracts::engine::EngineReport {
        ProcessEngine::new(invocation).with_poll_interval(Duration::from_millis(10)).invoke()
    }

    #[test]
    fn exit_zero_is_success() {
        let report = run(sh("exit 0"));
        assert_eq!(report.result, EngineResult::Success);
        assert_eq!(report.warning, None);
    }

    #[test]
    fn nonzero_exit_is_failure_with_code() {
        let report = run(sh("exit 7"));
        assert_eq!(report.failure_ref().unwrap().kind, FailureKind::NonZeroExit { code: 7 });
    }

    #[test]
    fn missing_binary_is_launch_failure() {
        let report = run(EngineInvocation::new("/nonexistent/safeguard-engine-binary"));
        let failure = report.failure_ref().unwrap();
        assert_eq!(failure.kind, FailureKind::LaunchFailed);
        assert!(failure.detail.contains("/nonexistent/safeguard-engine-binary"));
    }

    #[test]
    fn bad_working_directory_is_launch_failure() {
        let mut invocation = sh("exit 0");
        invocation.cwd = Some("/nonexistent/safeguard-cwd".into());
        assert_eq!(run(invocation).failure_ref().unwrap().kind, FailureKind::LaunchFailed);
    }

    #[test]
    fn timeout_kills_the_engine() {
        let mut invocation = sh("sleep 30");
        invocation.timeout_secs = 1;

        let report = run(invocation);

        assert_eq!(report.failure_ref().unwrap().kind, FailureKind::TimedOut { after_secs: 1 });
        assert!(report.elapsed < Duration::from_secs(10), "engine must not run to completion");
    }

    #[test]
    fn killed_by_signal_is_terminated() {
        let report = run(sh("kill -9 $$"));
        assert_eq!(report.failure_ref().unwrap().kind, FailureKind::Terminated);
    }

    #[test]
    fn warning_exit_code_is_success_with_warning() {
        let mut invocation = sh("exit 3");
        invocation.warning_exit_codes = vec![3];

        let report = run(invocation);

        assert!(report.is_success());
        assert!(report.warning.unwrap().contains("exit code 3"));
    }

    #[test]
    fn slow_run_raises_warning() {
        let mut invocation = sh("sleep 1");
        invocation.slow_run_warn_secs = Some(0);

        let report = run(invocation);

        assert!(report.is_success());
        assert!(report.warning.unwrap().contains("slow run"));
    }

    #[test]
    fn missing_artifact_raises_warning_present_one_does_not() {
        let dir = tempfile::tempdir().unwrap();

        let mut invocation = sh("touch present.json");
        invocation.cwd = Some(dir.path().to_path_buf());
        invocation.expected_artifacts = vec!["present.json".into()];
        let report = run(invocation.clone());
        assert!(report.is_success());
        assert_eq!(report.warning, None);

        invocation.expected_artifacts = vec!["present.json".into(), "absent.json".into()];
        let report = run(invocation);
        let warning = report.warning.unwrap();
        assert!(warning.contains("absent.json"));
        assert!(!warning.contains("present.json"));
    }

    #[test]
    fn slow_failure_keeps_its_warning() {
        let mut invocation = sh("sleep 1; exit 1");
        invocation.slow_run_warn_secs = Some(0);

        let report = run(invocation);

        assert_eq!(report.failure_ref().unwrap().kind, FailureKind::NonZeroExit { code: 1 });
        assert!(report.warning.unwrap().contains("slow run"));
    }

    #[test]
    fn failed_run_is_not_checked_for_artifacts() {
        let mut invocation = sh("exit 1");
        invocation.expected_artifacts = vec!["/nonexistent/output.json".into()];

        let report = run(invocation);

        assert!(!report.is_success());
        assert_eq!(report.warning, None);
    }
}
