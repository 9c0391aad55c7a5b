//! The SafeGuard cycle runner: one full evaluate-decide-persist sequence.
//!
//! The runner enforces the cycle order:
//!
//!   Lock → Load → Decide → [Engine::invoke] → Store → Journal → Status
//!
//! Nothing is reported to the caller as ran-success / ran-failure / blocked
//! until the new state has been stored. Any error after the lock is taken
//! aborts the cycle as a hard error and releases the lock.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use safeguard_contracts::{
    cycle::{CycleId, CycleRecord, CycleReport, Evaluation},
    error::{SafeguardError, SafeguardResult},
    state::SupervisorState,
    status::SchedulerMeta,
};

use crate::{
    status::derive_status,
    supervisor::Supervisor,
    traits::{Clock, CycleJournal, Engine, NoSchedule, SchedulePolicy, StateStore, StatusSink, SystemClock},
};

/// Drives one supervised cycle per call to `run_cycle()`.
///
/// The runner owns every collaborator. It keeps no state between calls:
/// everything carried to the next cycle goes through the `StateStore`.
pub struct CycleRunner {
    supervisor: Supervisor,
    engine: Box<dyn Engine>,
    store: Box<dyn StateStore>,
    journal: Box<dyn CycleJournal>,
    status: Box<dyn StatusSink>,
    schedule: Box<dyn SchedulePolicy>,
    clock: Box<dyn Clock>,
}

impl CycleRunner {
    /// Create a runner with no schedule policy and the system clock.
    pub fn new(
        supervisor: Supervisor,
        engine: Box<dyn Engine>,
        store: Box<dyn StateStore>,
        journal: Box<dyn CycleJournal>,
        status: Box<dyn StatusSink>,
    ) -> Self {
        Self {
            supervisor,
            engine,
            store,
            journal,
            status,
            schedule: Box::new(NoSchedule),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_schedule(mut self, schedule: Box<dyn SchedulePolicy>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run exactly one cycle.
    ///
    /// # Errors
    ///
    /// Returns `Err` for lock contention, unreadable or missing state, and
    /// any failure to persist state, journal or status. Engine failures and
    /// blocked cycles are NOT errors; they are `CycleOutcome` values.
    pub fn run_cycle(&self) -> SafeguardResult<CycleReport> {
        let cycle_id = CycleId::new();
        let started_at = self.clock.now();

        info!(cycle_id = %cycle_id, "cycle starting");

        self.run_locked(&cycle_id, started_at).inspect_err(|e| {
            error!(cycle_id = %cycle_id, error = %e, "cycle aborted with hard error");
        })
    }

    fn run_locked(&self, cycle_id: &CycleId, started_at: DateTime<Utc>) -> SafeguardResult<CycleReport> {
        // ── Lock: held until this function returns ───────────────────────────
        let _lock = self.store.lock()?;

        // ── Load ─────────────────────────────────────────────────────────────
        let prior = self.load_prior()?;

        // ── Decide + invoke ──────────────────────────────────────────────────
        let Evaluation { decision, outcome, state, engine } =
            self.supervisor.evaluate_and_run(&prior, self.engine.as_ref(), self.clock.as_ref());

        // ── Store: the decision is not durable before this succeeds ──────────
        self.store.store(&state)?;

        // ── Journal ──────────────────────────────────────────────────────────
        let finished_at = self.clock.now();
        let failure = engine.as_ref().and_then(|r| r.failure_ref());
        let record = CycleRecord {
            cycle_id: cycle_id.clone(),
            started_at,
            finished_at,
            decision,
            outcome,
            failure_kind: failure.map(|f| f.kind.clone()),
            failure_detail: failure.map(|f| f.detail.clone()),
            warning: engine.as_ref().and_then(|r| r.warning.clone()),
            consecutive_failures: state.consecutive_failures,
            safe_state: state.safe_state,
            warnings: state.warnings,
        };
        self.journal.append(&record)?;

        // ── Status ───────────────────────────────────────────────────────────
        let last_run = state.last_run_at.unwrap_or(finished_at);
        let meta = SchedulerMeta {
            last_run: Some(last_run),
            next_run: self.schedule.next_run(last_run),
        };
        let status = derive_status(&state, meta);
        self.status.publish(&status)?;

        info!(
            cycle_id = %cycle_id,
            decision = %decision,
            outcome = %outcome,
            consecutive_failures = state.consecutive_failures,
            safe_state = state.safe_state,
            warnings = state.warnings,
            traffic_light = %status.traffic_light,
            "cycle complete"
        );

        Ok(CycleReport {
            cycle_id: cycle_id.clone(),
            decision,
            outcome,
            state,
            status,
            engine,
        })
    }

    /// Persisted state, or defaults on a provably first-ever run.
    ///
    /// A missing state file with cycles already in the journal means the
    /// state was lost, which must not silently reset the failure count.
    fn load_prior(&self) -> SafeguardResult<SupervisorState> {
        if let Some(state) = self.store.load()? {
            return Ok(state);
        }

        let recorded_cycles = self.journal.len()?;
        if recorded_cycles > 0 {
            return Err(SafeguardError::StateMissing {
                path: self.store.location(),
                recorded_cycles,
            });
        }

        info!(path = %self.store.location().display(), "no state on record, initialising first run");
        Ok(SupervisorState::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
