//! Recurrence evaluation.
//!
//! Pure date arithmetic: given a rule and a query window, [`OccurrenceGenerator`]
//! decides on which calendar dates a group should have an occurrence. Nothing
//! here touches storage.

mod generator;

pub use generator::{default_cap, OccurrenceGenerator, DEFAULT_MONTHLY_ITERATION_LIMIT};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// `YYYY-MM-DD` key used for exclusion sets and duplicate checks.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

/// 23:59:59.999 UTC on `date`.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Combine a calendar date with the wall-clock time of `anchor`.
pub fn at_time_of(date: NaiveDate, anchor: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(anchor.time()), Utc)
}
