//! Loading and validating the SafeGuard configuration.
//!
//! `SafeguardConfig` is the checked, immutable result of reading a TOML
//! `ConfigFile`. It is built once at startup and passed by value to the
//! components that need it; nothing reads configuration from globals.
//!
//! Validation:
//!
//! 1. `supervisor.max_failures >= 1`
//! 2. `engine.program` is non-empty and `engine.timeout_secs >= 1`
//! 3. `schedule.interval.minutes >= 1`
//! 4. `schedule.daily.at` is `HH:MM` and every weekday name parses
//!
//! Relative storage paths resolve against the config file's directory.

use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use tracing::debug;

use safeguard_contracts::{
    config::{EngineInvocation, SupervisorConfig},
    error::{SafeguardError, SafeguardResult},
};

use crate::{
    file::{ConfigFile, ScheduleSection},
    schedule::{parse_time_of_day, parse_weekday, DailySchedule, IntervalSchedule, Schedule},
};

/// Where the state, status and journal files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub state_path: PathBuf,
    pub status_path: PathBuf,
    pub journal_path: PathBuf,
}

/// Fully validated configuration.
#[derive(Debug, Clone)]
pub struct SafeguardConfig {
    pub supervisor: SupervisorConfig,
    pub storage: StoragePaths,
    pub schedule: Schedule,
}

impl SafeguardConfig {
    /// Parse `s` as TOML and validate it.
    ///
    /// Relative storage paths are joined onto `base_dir`.
    ///
    /// Returns `SafeguardError::ConfigError` if the TOML is malformed, does not
    /// match the `ConfigFile` schema, or fails validation.
    pub fn from_toml_str(s: &str, base_dir: &Path) -> SafeguardResult<Self> {
        let file: ConfigFile = toml::from_str(s).map_err(|e| config_error(format!("failed to parse config TOML: {}", e)))?;
        Self::from_config_file(file, base_dir)
    }

    /// Read and validate the file at `path`.
    pub fn from_file(path: &Path) -> SafeguardResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("failed to read config file '{}': {}", path.display(), e)))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        debug!(path = %path.display(), "loading configuration");
        Self::from_toml_str(&contents, base_dir)
    }

    /// Validate an already-deserialized `ConfigFile`.
    pub fn from_config_file(file: ConfigFile, base_dir: &Path) -> SafeguardResult<Self> {
        let max_failures = NonZeroU32::new(file.supervisor.max_failures)
            .ok_or_else(|| config_error("supervisor.max_failures must be at least 1"))?;

        let engine = file.engine;
        if engine.program.trim().is_empty() {
            return Err(config_error("engine.program must not be empty"));
        }
        if engine.timeout_secs == 0 {
            return Err(config_error("engine.timeout_secs must be at least 1"));
        }

        let invocation = EngineInvocation {
            program: engine.program,
            args: engine.args,
            cwd: engine.cwd.map(|cwd| resolve(base_dir, cwd)),
            timeout_secs: engine.timeout_secs,
            slow_run_warn_secs: engine.slow_run_warn_secs,
            warning_exit_codes: engine.warning_exit_codes,
            expected_artifacts: engine.expected_artifacts,
        };

        let supervisor = SupervisorConfig::new(invocation)
            .with_max_failures(max_failures)
            .with_auto_resume(file.supervisor.auto_resume);

        let storage = StoragePaths {
            state_path: resolve(base_dir, file.storage.state_path),
            status_path: resolve(base_dir, file.storage.status_path),
            journal_path: resolve(base_dir, file.storage.journal_path),
        };

        let schedule = build_schedule(file.schedule)?;

        debug!(
            max_failures = supervisor.max_failures.get(),
            auto_resume = supervisor.auto_resume,
            engine = %supervisor.engine_invocation.display(),
            state_path = %storage.state_path.display(),
            "configuration validated"
        );

        Ok(Self { supervisor, storage, schedule })
    }
}

fn build_schedule(section: ScheduleSection) -> SafeguardResult<Schedule> {
    match section {
        ScheduleSection::None => Ok(Schedule::None),
        ScheduleSection::Interval { minutes } => {
            if minutes == 0 {
                return Err(config_error("schedule.minutes must be at least 1"));
            }
            Ok(Schedule::Interval(IntervalSchedule { minutes }))
        }
        ScheduleSection::Daily { at, weekdays } => {
            let at = parse_time_of_day(&at)
                .ok_or_else(|| config_error(format!("schedule.at '{}' is not a valid HH:MM time", at)))?;
            let weekdays = weekdays
                .iter()
                .map(|d| parse_weekday(d).ok_or_else(|| config_error(format!("schedule.weekdays: unknown day '{}'", d))))
                .collect::<SafeguardResult<Vec<_>>>()?;
            Ok(Schedule::Daily(DailySchedule { at, weekdays }))
        }
    }
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn config_error(reason: impl Into<String>) -> SafeguardError {
    SafeguardError::ConfigError { reason: reason.into() }
}
