//! Traffic-light derivation and status record assembly.
//!
//! Pure functions of `SupervisorState`. The light reflects the failure trend,
//! not the block: RED means two or more failures in a row even when
//! `max_failures` is higher and SAFE STATE has not tripped yet.

use safeguard_contracts::{
    state::SupervisorState,
    status::{SafeGuardSnapshot, SchedulerMeta, StatusRecord, TrafficLight},
};

/// GREEN / YELLOW / RED from the failure and warning counters.
pub fn traffic_light(state: &SupervisorState) -> TrafficLight {
    match (state.consecutive_failures, state.warnings) {
        (0, 0) => TrafficLight::Green,
        (0, _) | (1, _) => TrafficLight::Yellow,
        _ => TrafficLight::Red,
    }
}

/// Build the observer-facing record for the current state.
///
/// `meta.next_run` is copied through untouched.
pub fn derive_status(state: &SupervisorState, meta: SchedulerMeta) -> StatusRecord {
    StatusRecord {
        safe_guard: SafeGuardSnapshot {
            state: state.safe_state,
            failures: state.consecutive_failures,
            warnings: state.warnings,
        },
        scheduler: meta,
        traffic_light: traffic_light(state),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use safeguard_contracts::{
        state::SupervisorState,
        status::{SchedulerMeta, TrafficLight},
    };

    use super::{derive_status, traffic_light};

    fn state(failures: u32, warnings: u64) -> SupervisorState {
        SupervisorState {
            consecutive_failures: failures,
            warnings,
            ..SupervisorState::default()
        }
    }

    #[test]
    fn light_table() {
        assert_eq!(traffic_light(&state(0, 0)), TrafficLight::Green);
        assert_eq!(traffic_light(&state(0, 1)), TrafficLight::Yellow);
        assert_eq!(traffic_light(&state(0, 40)), TrafficLight::Yellow);
        assert_eq!(traffic_light(&state(1, 0)), TrafficLight::Yellow);
        assert_eq!(traffic_light(&state(1, 9)), TrafficLight::Yellow);
        assert_eq!(traffic_light(&state(2, 0)), TrafficLight::Red);
        assert_eq!(traffic_light(&state(17, 3)), TrafficLight::Red);
    }

    #[test]
    fn red_does_not_depend_on_safe_state() {
        let mut s = state(2, 0);
        s.safe_state = false;
        assert_eq!(traffic_light(&s), TrafficLight::Red);
        s.safe_state = true;
        assert_eq!(traffic_light(&s), TrafficLight::Red);
    }

    #[test]
    fn derive_status_copies_counters_and_schedule() {
        let last_run = Utc.timestamp_opt(1_760_000_000, 500).unwrap();
        let mut s = state(1, 2);
        s.safe_state = true;
        let meta = SchedulerMeta {
            last_run: Some(last_run),
            next_run: Some("opaque-token-42".to_string()),
        };

        let record = derive_status(&s, meta.clone());

        assert!(record.safe_guard.state);
        assert_eq!(record.safe_guard.failures, 1);
        assert_eq!(record.safe_guard.warnings, 2);
        assert_eq!(record.scheduler, meta);
        assert_eq!(record.traffic_light, TrafficLight::Yellow);
    }
}
