//! Occurrence date generation for daily, weekly and monthly rules.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use tracing::warn;

use crate::occurrence::RecurrenceTag;

/// Upper bound on monthly steps examined per call.
pub const DEFAULT_MONTHLY_ITERATION_LIMIT: usize = 365;

/// Cap used when a rule has no until-date: `horizon_months` after the anchor.
pub fn default_cap(anchor: DateTime<Utc>, horizon_months: u32) -> DateTime<Utc> {
    anchor
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Computes the calendar dates on which a rule has occurrences.
///
/// The anchor date itself is never returned: it is occurrence #1 and is
/// already represented by the group root.
#[derive(Debug, Clone)]
pub struct OccurrenceGenerator {
    monthly_iteration_limit: usize,
}

impl Default for OccurrenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OccurrenceGenerator {
    pub fn new() -> Self {
        Self {
            monthly_iteration_limit: DEFAULT_MONTHLY_ITERATION_LIMIT,
        }
    }

    pub fn with_monthly_limit(mut self, limit: usize) -> Self {
        self.monthly_iteration_limit = limit;
        self
    }

    /// Ascending, duplicate-free dates inside `[window_start, min(window_end, cap)]`.
    ///
    /// Bounds are compared by calendar date, so the effective end is
    /// inclusive up to the end of its day.
    pub fn generate(
        &self,
        tag: RecurrenceTag,
        anchor: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        cap: DateTime<Utc>,
    ) -> Vec<NaiveDate> {
        let anchor_date = anchor.date_naive();
        let from = window_start.date_naive();
        let until = window_end.min(cap).date_naive();

        if until < from {
            return Vec::new();
        }

        match tag {
            RecurrenceTag::None => Vec::new(),
            RecurrenceTag::Daily => Self::daily(anchor_date, from, until),
            RecurrenceTag::Weekly => Self::weekly(anchor_date, from, until),
            RecurrenceTag::Monthly => self.monthly(anchor_date, from, until),
            RecurrenceTag::DailyBusinessDays => {
                warn!("daily_business_days recurrence is not implemented; nothing generated");
                Vec::new()
            }
        }
    }

    fn daily(anchor: NaiveDate, from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let Some(first) = anchor.succ_opt() else {
            return Vec::new();
        };

        let mut dates = Vec::new();
        let mut current = first.max(from);
        while current <= until {
            dates.push(current);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        dates
    }

    fn weekly(anchor: NaiveDate, from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let week = Days::new(7);
        let Some(mut current) = anchor.checked_add_days(week) else {
            return Vec::new();
        };

        // Jump whole weeks up to the window start
        if current < from {
            let behind = (from - current).num_days();
            let weeks = (behind + 6) / 7;
            match current.checked_add_days(Days::new(weeks as u64 * 7)) {
                Some(next) => current = next,
                None => return Vec::new(),
            }
        }

        let mut dates = Vec::new();
        while current <= until {
            dates.push(current);
            match current.checked_add_days(week) {
                Some(next) => current = next,
                None => break,
            }
        }
        dates
    }

    fn monthly(&self, anchor: NaiveDate, from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        for step in 1..=self.monthly_iteration_limit {
            // Offset from the anchor each time so a clamped day (31 -> 30)
            // does not carry into later months.
            let Some(candidate) = anchor.checked_add_months(Months::new(step as u32)) else {
                break;
            };
            if candidate > until {
                break;
            }
            if candidate >= from {
                dates.push(candidate);
            }
        }
        dates
    }
}
