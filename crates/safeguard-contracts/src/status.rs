//! Observer-facing status record.
//!
//! `StatusRecord` is a derived view regenerated every cycle. It has no
//! identity or history of its own and is never read back as a decision
//! input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-level health summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl std::fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrafficLight::Green => "GREEN",
            TrafficLight::Yellow => "YELLOW",
            TrafficLight::Red => "RED",
        };
        f.write_str(s)
    }
}

/// Snapshot of the supervisor counters at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeGuardSnapshot {
    /// Mirrors `SupervisorState::safe_state`.
    pub state: bool,
    /// Mirrors `SupervisorState::consecutive_failures`.
    pub failures: u32,
    /// Mirrors `SupervisorState::warnings`.
    pub warnings: u64,
}

/// Scheduling metadata echoed into the status record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerMeta {
    pub last_run: Option<DateTime<Utc>>,
    /// Opaque token from the external scheduling policy, copied unchanged.
    pub next_run: Option<String>,
}

/// The combined record written once per cycle for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub safe_guard: SafeGuardSnapshot,
    pub scheduler: SchedulerMeta,
    pub traffic_light: TrafficLight,
}
