//! Schedule policies that fill `scheduler.next_run`.
//!
//! The supervisor never acts on these; they only tell observers when the
//! external trigger is expected to fire next. Tokens are RFC 3339 UTC.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};

use safeguard_core::traits::SchedulePolicy;

/// Every `minutes` after the last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSchedule {
    pub minutes: u64,
}

impl SchedulePolicy for IntervalSchedule {
    fn next_run(&self, last_run: DateTime<Utc>) -> Option<String> {
        let minutes = i64::try_from(self.minutes).ok()?;
        let next = last_run.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Some(next.to_rfc3339())
    }
}

/// A fixed time of day, optionally restricted to some weekdays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
    /// Empty means every day.
    pub weekdays: Vec<Weekday>,
}

impl DailySchedule {
    fn runs_on(&self, day: Weekday) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&day)
    }
}

impl SchedulePolicy for DailySchedule {
    /// First slot strictly after `last_run`.
    fn next_run(&self, last_run: DateTime<Utc>) -> Option<String> {
        let mut day = last_run.date_naive();
        // Today plus one full week covers every weekday filter.
        for _ in 0..=7 {
            let candidate = day.and_time(self.at).and_utc();
            if candidate > last_run && self.runs_on(candidate.weekday()) {
                return Some(candidate.to_rfc3339());
            }
            day = day.succ_opt()?;
        }
        None
    }
}

/// The configured policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Schedule {
    #[default]
    None,
    Interval(IntervalSchedule),
    Daily(DailySchedule),
}

impl SchedulePolicy for Schedule {
    fn next_run(&self, last_run: DateTime<Utc>) -> Option<String> {
        match self {
            Schedule::None => None,
            Schedule::Interval(s) => s.next_run(last_run),
            Schedule::Daily(s) => s.next_run(last_run),
        }
    }
}

/// Parse `"HH:MM"` (24h).
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Parse `"mon"`, `"Monday"`, ... case-insensitively.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}
