//! # safeguard-store
//!
//! Persistence for the SafeGuard supervisor.
//!
//! - `JsonFileStateStore` : state file + sibling lock file, atomic replace
//! - `JsonFileStatusSink` : observer-facing status record, atomic replace
//! - `InMemoryStateStore`, `InMemoryStatusSink` : doubles for tests
//!
//! A missing state file loads as `None`. An unreadable, unparsable or
//! unknown-version state file is an error; it is never replaced by defaults.

mod fsutil;
pub mod lock;
pub mod memory;
pub mod state;
pub mod status;

pub use memory::{InMemoryStateStore, InMemoryStatusSink};
pub use state::JsonFileStateStore;
pub use status::JsonFileStatusSink;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use safeguard_contracts::{
        error::SafeguardError,
        state::{RunOutcome, SupervisorState},
        status::{SafeGuardSnapshot, SchedulerMeta, StatusRecord, TrafficLight},
    };
    use safeguard_core::traits::{StateStore, StatusSink};

    use super::{lock, InMemoryStateStore, InMemoryStatusSink, JsonFileStateStore, JsonFileStatusSink};

    fn sample_state() -> SupervisorState {
        let at = Utc.timestamp_opt(1_760_000_000, 987_654_321).unwrap();
        SupervisorState {
            safe_state: true,
            consecutive_failures: 3,
            warnings: 5,
            last_outcome: Some(RunOutcome::Failure),
            last_run_at: Some(at),
            last_success_at: Some(at - chrono::Duration::hours(49)),
            last_failure_at: Some(at),
            last_error: Some("exit_code=1: exit status: 1".to_string()),
            ..SupervisorState::default()
        }
    }

    // ── State file ───────────────────────────────────────────────────────────

    #[test]
    fn missing_state_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn state_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("nested/state.json"));

        store.store(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_state()));
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn garbage_state_file_is_corrupt_not_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ \"safe_state\": tru").unwrap();

        let err = JsonFileStateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SafeguardError::StateCorrupt { .. }));
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut value = serde_json::to_value(sample_state()).unwrap();
        value["version"] = serde_json::json!(99);
        std::fs::write(&path, value.to_string()).unwrap();

        match JsonFileStateStore::new(&path).load() {
            Err(SafeguardError::StateCorrupt { reason, .. }) => assert!(reason.contains("99")),
            other => panic!("expected StateCorrupt, got {:?}", other),
        }
    }

    #[test]
    fn unknown_field_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut value = serde_json::to_value(sample_state()).unwrap();
        value["decay_after_days"] = serde_json::json!(7);
        std::fs::write(&path, value.to_string()).unwrap();

        let err = JsonFileStateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SafeguardError::StateCorrupt { .. }));
    }

    #[test]
    fn store_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let store = JsonFileStateStore::new(blocker.join("state.json"));
        let err = store.store(&sample_state()).unwrap_err();
        assert!(matches!(err, SafeguardError::StateWriteFailed { .. }));
    }

    // ── Lock file ────────────────────────────────────────────────────────────

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        let other = JsonFileStateStore::new(dir.path().join("state.json"));

        let guard = store.lock().unwrap();
        assert!(store.lock_path().exists());
        let holder = lock::read_holder(store.lock_path()).unwrap();
        assert_eq!(holder.pid, std::process::id());

        assert!(matches!(other.lock().unwrap_err(), SafeguardError::LockHeld { .. }));

        drop(guard);
        assert!(!store.lock_path().exists());
        let _again = other.lock().unwrap();
    }

    #[test]
    fn held_lock_names_its_holder() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        let _guard = store.lock().unwrap();

        let err = JsonFileStateStore::new(dir.path().join("state.json")).lock().unwrap_err();
        assert!(err.to_string().contains(&format!("pid {}", std::process::id())));
    }

    #[test]
    fn stale_lock_reports_recorded_pid() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        std::fs::write(store.lock_path(), r#"{"pid":4242,"acquired_at":"2025-10-09T08:00:00+00:00"}"#).unwrap();

        match store.lock().unwrap_err() {
            SafeguardError::LockHeld { path, holder } => {
                assert_eq!(path.as_path(), store.lock_path());
                assert_eq!(holder, "pid 4242 since 2025-10-09T08:00:00+00:00");
            }
            other => panic!("expected LockHeld, got {:?}", other),
        }

        std::fs::write(store.lock_path(), "").unwrap();
        let err = store.lock().unwrap_err();
        assert!(err.to_string().contains("holder unknown"));
    }

    #[test]
    fn lock_path_keeps_full_file_name() {
        let store = JsonFileStateStore::new("/var/lib/safeguard/state.json");
        assert_eq!(store.lock_path(), std::path::Path::new("/var/lib/safeguard/state.json.lock"));
    }

    // ── Status file ──────────────────────────────────────────────────────────

    #[test]
    fn status_publish_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileStatusSink::new(dir.path().join("status.json"));
        assert_eq!(sink.read().unwrap(), None);

        let record = StatusRecord {
            safe_guard: SafeGuardSnapshot { state: false, failures: 1, warnings: 0 },
            scheduler: SchedulerMeta {
                last_run: Some(Utc.timestamp_opt(1_760_000_000, 0).unwrap()),
                next_run: None,
            },
            traffic_light: TrafficLight::Yellow,
        };
        sink.publish(&record).unwrap();
        assert_eq!(sink.read().unwrap(), Some(record));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(sink.path()).unwrap()).unwrap();
        assert_eq!(raw["traffic_light"], "YELLOW");
        assert_eq!(raw["safe_guard"]["failures"], 1);
    }

    // ── In-memory doubles ────────────────────────────────────────────────────

    #[test]
    fn in_memory_store_lock_and_write_failure() {
        let store = InMemoryStateStore::new();
        let guard = store.lock().unwrap();
        assert!(store.is_locked());
        assert!(store.lock().is_err());
        drop(guard);
        assert!(!store.is_locked());

        store.fail_writes(true);
        assert!(store.store(&sample_state()).is_err());
        assert_eq!(store.snapshot(), None);

        store.fail_writes(false);
        store.store(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_state()));
    }

    #[test]
    fn in_memory_doubles_drive_a_full_cycle() {
        use std::num::NonZeroU32;

        use safeguard_contracts::{
            config::{EngineInvocation, SupervisorConfig},
            cycle::CycleOutcome,
            engine::{EngineReport, FailureKind},
        };
        use safeguard_core::{traits::Engine, CycleRunner, Supervisor};
        use safeguard_journal::InMemoryJournal;

        struct AlwaysFails;

        impl Engine for AlwaysFails {
            fn invoke(&self) -> EngineReport {
                EngineReport::failure(FailureKind::NonZeroExit { code: 1 }, "exit status: 1")
            }
        }

        let store = InMemoryStateStore::new();
        let journal = InMemoryJournal::new();
        let sink = InMemoryStatusSink::new();
        let config = SupervisorConfig::new(EngineInvocation::new("engine"))
            .with_max_failures(NonZeroU32::new(1).unwrap())
            .with_auto_resume(false);
        let runner = CycleRunner::new(
            Supervisor::new(config),
            Box::new(AlwaysFails),
            Box::new(store.clone()),
            Box::new(journal.clone()),
            Box::new(sink.clone()),
        );

        assert_eq!(runner.run_cycle().unwrap().outcome, CycleOutcome::RanFailure);
        let published = sink.latest().unwrap();
        assert!(published.safe_guard.state);
        assert_eq!(published.safe_guard.failures, 1);
        assert_eq!(published.traffic_light, TrafficLight::Yellow);

        assert_eq!(runner.run_cycle().unwrap().outcome, CycleOutcome::Blocked);
        assert_eq!(sink.count(), 2);
        assert_eq!(journal.entries().len(), 2);

        // A cycle whose state write fails publishes nothing.
        store.fail_writes(true);
        assert!(matches!(runner.run_cycle().unwrap_err(), SafeguardError::StateWriteFailed { .. }));
        assert_eq!(sink.count(), 2);
        assert_eq!(journal.entries().len(), 2);
        assert!(!store.is_locked());
    }
}
