//! Continuous week numbering anchored at a dataset's first day

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{Result, StatsError};

/// Years covered by the table built during loading
pub const DEFAULT_HORIZON_YEARS: u32 = 30;

/// Precomputed date -> week number lookup
///
/// Week 1 starts at the anchor date, whatever its weekday, and the number
/// increments every time the iteration reaches a Monday.
#[derive(Debug, Clone)]
pub struct CalendarTable {
    anchor: NaiveDate,
    end: NaiveDate,
    weeks: HashMap<NaiveDate, u32>,
}

impl CalendarTable {
    /// Build the table over `[anchor, anchor + horizon_years * 365 days]`
    pub fn build(anchor: NaiveDate, horizon_years: u32) -> Self {
        let end = anchor + Duration::days(horizon_years as i64 * 365);
        let mut weeks = HashMap::with_capacity((end - anchor).num_days() as usize + 1);

        let mut week_no = 1;
        let mut current = anchor;
        while current <= end {
            weeks.insert(current, week_no);
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if current.weekday() == Weekday::Mon {
                week_no += 1;
            }
        }

        Self { anchor, end, weeks }
    }

    /// Week number for a date inside the table
    pub fn week_of(&self, date: NaiveDate) -> Result<u32> {
        self.weeks
            .get(&date)
            .copied()
            .ok_or(StatsError::CalendarRange(date))
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}
