//! Activity data models for club exports
//!
//! One [`ActivityRecord`] per logged run, plus the calendar types derived from it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{Result, StatsError};

/// Slowest pace still counted as a regular run
pub const REGULAR_PACE_LIMIT_SECS: i64 = 10 * 60;

/// Kind of run as reported by the export
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunType {
    Outdoor,
    Indoor,
    /// Any label the exports use that we do not classify
    Other(String),
}

impl RunType {
    /// Classify an export label
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "室外跑步" | "outdoor" | "Outdoor" => RunType::Outdoor,
            "室内跑步" | "indoor" | "Indoor" => RunType::Indoor,
            other => RunType::Other(other.to_string()),
        }
    }

    /// Label written back to the cache
    pub fn label(&self) -> &str {
        match self {
            RunType::Outdoor => "outdoor",
            RunType::Indoor => "indoor",
            RunType::Other(label) => label,
        }
    }
}

/// A calendar month with no day component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(StatsError::invalid_param(format!("month out of range: {}", month)));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short axis label (`YY-MM`)
    pub fn short_label(&self) -> String {
        format!("{:02}-{:02}", self.year.rem_euclid(100), self.month)
    }

    /// Months since year zero, used as a sort key
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StatsError::parse(format!("invalid month '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One logged run
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    /// Time the run finished
    pub end_time: NaiveDateTime,
    /// Export status column, carried through untouched
    pub status: String,
    pub user_id: i64,
    pub user_name: String,
    pub gender: String,
    /// Distance in kilometers
    pub distance: f64,
    pub duration: Duration,
    pub run_type: RunType,
    /// Time per kilometer
    pub pace: Duration,
    /// Steps per minute
    pub cadence: i64,
    /// Stride length in meters
    pub stride_length: f64,

    // Derived after load
    pub year: i32,
    pub month: YearMonth,
    /// Continuous week index, 1 at the dataset's earliest record
    pub week_no: u32,
}

impl ActivityRecord {
    /// Calendar date of `end_time`
    pub fn date(&self) -> NaiveDate {
        self.end_time.date()
    }

    /// Outdoor run at or faster than ten minutes per kilometer
    pub fn is_regular(&self) -> bool {
        self.run_type == RunType::Outdoor && self.pace.num_seconds() <= REGULAR_PACE_LIMIT_SECS
    }

    /// Fill `year` and `month` from `end_time`
    pub fn derive_calendar_fields(&mut self) {
        self.year = self.end_time.year();
        self.month = YearMonth::of(self.date());
    }
}
