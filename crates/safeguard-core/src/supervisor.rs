//! The SafeGuard supervisor: decide, invoke, record.
//!
//! One evaluation per cycle:
//!
//!   prior state → Decision → [Engine::invoke] → state transition
//!
//! `Engine::invoke()` is only reachable when `decide()` returns `Run` or
//! `Probe`. A blocked cycle never touches the engine.
//!
//! Transitions (states NORMAL and SAFE_BLOCKED):
//!
//! - NORMAL       --failure, count < max-->  NORMAL
//! - NORMAL       --failure, count >= max--> SAFE_BLOCKED
//! - NORMAL       --success-->               NORMAL
//! - SAFE_BLOCKED --no auto_resume-->        SAFE_BLOCKED (engine not invoked)
//! - SAFE_BLOCKED --probe succeeds-->        NORMAL
//! - SAFE_BLOCKED --probe fails-->           SAFE_BLOCKED

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use safeguard_contracts::{
    config::SupervisorConfig,
    cycle::{CycleOutcome, Decision, Evaluation},
    engine::{EngineReport, EngineResult},
    state::{SupervisorMode, SupervisorState},
};

use crate::traits::{Clock, Engine};

/// Failure-tracking wrapper around one engine.
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Whether the engine may run given the persisted state.
    pub fn decide(&self, prior: &SupervisorState) -> Decision {
        match (prior.mode(), self.config.auto_resume) {
            (SupervisorMode::Normal, _) => Decision::Run,
            (SupervisorMode::SafeBlocked, true) => Decision::Probe,
            (SupervisorMode::SafeBlocked, false) => Decision::Block,
        }
    }

    /// Run one cycle's worth of supervision against `prior`.
    ///
    /// Invokes `engine` at most once. The returned state is not yet durable;
    /// the caller persists it.
    pub fn evaluate_and_run(
        &self,
        prior: &SupervisorState,
        engine: &dyn Engine,
        clock: &dyn Clock,
    ) -> Evaluation {
        let decision = self.decide(prior);

        match decision {
            Decision::Block => {
                warn!(
                    consecutive_failures = prior.consecutive_failures,
                    max_failures = self.config.max_failures.get(),
                    "SAFE STATE active and auto_resume disabled, engine not invoked"
                );
            }
            Decision::Probe => {
                info!(
                    consecutive_failures = prior.consecutive_failures,
                    engine = %self.config.engine_invocation.display(),
                    "SAFE STATE active, probing engine once"
                );
            }
            Decision::Run => {
                debug!(
                    consecutive_failures = prior.consecutive_failures,
                    engine = %self.config.engine_invocation.display(),
                    "invoking engine"
                );
            }
        }

        let report = decision.invokes_engine().then(|| engine.invoke());
        let now = clock.now();
        let (state, outcome) = self.apply(prior, decision, report.as_ref(), now);

        Evaluation { decision, outcome, state, engine: report }
    }

    /// Pure state transition for one cycle.
    ///
    /// `report` must be `Some` exactly when `decision` invokes the engine;
    /// a missing report for an invoking decision is recorded as a blocked
    /// cycle so no count is ever fabricated.
    pub fn apply(
        &self,
        prior: &SupervisorState,
        decision: Decision,
        report: Option<&EngineReport>,
        now: DateTime<Utc>,
    ) -> (SupervisorState, CycleOutcome) {
        let mut next = prior.clone();
        next.last_run_at = Some(now);

        let report = match (decision.invokes_engine(), report) {
            (true, Some(report)) => report,
            _ => {
                next.last_outcome = Some(CycleOutcome::Blocked.run_outcome());
                return (next, CycleOutcome::Blocked);
            }
        };

        if let Some(warning) = &report.warning {
            next.warnings = next.warnings.saturating_add(1);
            warn!(warning = %warning, warnings = next.warnings, "engine reported a warning");
        }

        let outcome = match &report.result {
            EngineResult::Success => {
                if prior.safe_state {
                    info!("probe succeeded, SAFE STATE cleared");
                }
                next.consecutive_failures = 0;
                next.safe_state = false;
                next.last_success_at = Some(now);
                next.last_error = None;
                CycleOutcome::RanSuccess
            }
            EngineResult::Failure(failure) => {
                next.consecutive_failures = next.consecutive_failures.saturating_add(1);
                next.last_failure_at = Some(now);
                next.last_error = Some(format!("{}: {}", failure.kind, failure.detail));

                let max = self.config.max_failures.get();
                warn!(
                    failure_kind = %failure.kind,
                    detail = %failure.detail,
                    consecutive_failures = next.consecutive_failures,
                    max_failures = max,
                    probe = decision == Decision::Probe,
                    "engine run failed"
                );

                if next.consecutive_failures >= max {
                    if !prior.safe_state {
                        warn!(
                            consecutive_failures = next.consecutive_failures,
                            max_failures = max,
                            "failure threshold reached, entering SAFE STATE"
                        );
                    }
                    next.safe_state = true;
                }
                CycleOutcome::RanFailure
            }
        };
        next.last_outcome = Some(outcome.run_outcome());

        (next, outcome)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
