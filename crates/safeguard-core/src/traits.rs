//! Trait seams of the SafeGuard cycle.
//!
//! - `Engine`         : the unreliable external process (untrusted)
//! - `StateStore`     : lock-guarded persistence of `SupervisorState`
//! - `StatusSink`     : where the observer-facing `StatusRecord` goes
//! - `CycleJournal`   : append-only record of completed cycles
//! - `SchedulePolicy` : external source of the `next_run` token
//! - `Clock`          : wall-clock time, injectable for tests
//!
//! `CycleRunner` wires them together in the lock → load → decide → run →
//! store → journal → status order.

use chrono::{DateTime, Utc};

use safeguard_contracts::{
    cycle::CycleRecord, engine::EngineReport, error::SafeguardResult, state::SupervisorState,
    status::StatusRecord,
};

/// One synchronous invocation of the supervised engine.
///
/// Implementations must not return errors: every way the engine can go wrong
/// is reported as an `EngineReport` carrying a failure.
pub trait Engine: Send + Sync {
    fn invoke(&self) -> EngineReport;
}

/// Exclusive hold on a `StateStore`, released on drop.
///
/// Stores build one with a release callback (e.g. removing a lock file).
#[must_use = "the state lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("held", &self.release.is_some()).finish()
    }
}

/// Persistence for the supervisor's single source of truth.
///
/// Callers hold the guard from `lock()` for the whole read-decide-write
/// sequence.
pub trait StateStore: Send + Sync {
    /// Acquire the exclusive lock. Fails with `LockHeld` under contention.
    fn lock(&self) -> SafeguardResult<LockGuard>;

    /// Load the persisted state.
    ///
    /// `Ok(None)` means no state has ever been written. Unreadable or
    /// unparsable state is an error, never `None`.
    fn load(&self) -> SafeguardResult<Option<SupervisorState>>;

    /// Durably replace the persisted state.
    fn store(&self, state: &SupervisorState) -> SafeguardResult<()>;

    /// Human-readable location, used in error messages.
    fn location(&self) -> std::path::PathBuf;
}

/// Destination for the regenerated status record.
pub trait StatusSink: Send + Sync {
    fn publish(&self, record: &StatusRecord) -> SafeguardResult<()>;
}

/// Append-only record of completed cycles.
pub trait CycleJournal: Send + Sync {
    /// Append one record. Records are never modified afterwards.
    fn append(&self, record: &CycleRecord) -> SafeguardResult<()>;

    /// Number of records on file.
    fn len(&self) -> SafeguardResult<u64>;

    fn is_empty(&self) -> SafeguardResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// External scheduling policy. The core only echoes what it returns.
pub trait SchedulePolicy: Send + Sync {
    /// Opaque token describing the next scheduled run, if any.
    fn next_run(&self, last_run: DateTime<Utc>) -> Option<String>;
}

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A policy that never schedules anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchedule;

impl SchedulePolicy for NoSchedule {
    fn next_run(&self, _last_run: DateTime<Utc>) -> Option<String> {
        None
    }
}
