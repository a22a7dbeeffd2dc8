//! Date coverage checks for period files
//!
//! Every period file names the window it is supposed to cover, e.g.
//! `club_20230101-0131.xlsx` covers 2023-01-01 through 2023-01-31. The observed
//! first and last run dates of the file must match that window exactly, and
//! every month between the first and last year seen must have a matching file.
//! Neither check interrupts loading; failures become [`ValidationWarning`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

use crate::models::YearMonth;

/// Year plus start/end month-day encoded in a period file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub year: i32,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
}

fn window_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})[-_]?(\d{2})(\d{2})-(\d{2})(\d{2})\.[A-Za-z0-9]+$")
            .expect("period file pattern is a valid regex")
    })
}

impl PeriodWindow {
    /// Extract the window from a file name (`...YYYYMMDD-MMDD.ext`, `YYYY-MMDD-MMDD.ext`)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = window_pattern().captures(name)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        Some(Self {
            year: caps.get(1)?.as_str().parse().ok()?,
            start_month: num(2)?,
            start_day: num(3)?,
            end_month: num(4)?,
            end_day: num(5)?,
        })
    }

    /// Key the window is filed under for month coverage
    pub fn month(&self) -> (i32, u32) {
        (self.year, self.start_month)
    }

    /// Whether the observed first/last dates are exactly the window bounds
    pub fn matches(&self, first: NaiveDate, last: NaiveDate) -> bool {
        (first.year(), first.month(), first.day())
            == (self.year, self.start_month, self.start_day)
            && (last.year(), last.month(), last.day()) == (self.year, self.end_month, self.end_day)
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}{:02}-{:02}{:02}",
            self.year, self.start_month, self.start_day, self.end_month, self.end_day
        )
    }
}

/// Non-fatal problems found while loading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    #[error("{file}: expected {expected}, found {first} ~ {last}")]
    RangeMismatch {
        file: String,
        expected: PeriodWindow,
        first: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("{file}: file name does not encode a date window")]
    UnrecognizedFileName { file: String },

    #[error("{file}: no activity rows")]
    EmptyFile { file: String },

    #[error("{file}: rows are not in chronological order")]
    OutOfOrder { file: String },

    #[error("{month}: no validated period file")]
    MissingMonth { month: YearMonth },
}

/// Outcome of loading one period file
#[derive(Debug, Clone)]
pub struct FileCoverage {
    pub file: String,
    pub window: Option<PeriodWindow>,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub rows: usize,
    pub valid: bool,
}

/// Per-file coverage and every warning raised during a load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub files: Vec<FileCoverage>,
    pub warnings: Vec<ValidationWarning>,
}

impl LoadReport {
    /// No warnings were raised
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn missing_months(&self) -> Vec<YearMonth> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                ValidationWarning::MissingMonth { month } => Some(*month),
                _ => None,
            })
            .collect()
    }
}

/// Running record of which months have a validated file
#[derive(Debug, Default)]
pub struct CoverageTracker {
    months: BTreeMap<(i32, u32), bool>,
    years: Option<(i32, i32)>,
}

impl CoverageTracker {
    /// Record one file's window check; a later file for the same month replaces the result
    pub fn record(&mut self, window: &PeriodWindow, valid: bool) {
        self.years = Some(match self.years {
            Some((min, max)) => (min.min(window.year), max.max(window.year)),
            None => (window.year, window.year),
        });
        self.months.insert(window.month(), valid);
    }

    /// Months in the observed year range lacking a validated file
    pub fn missing_months(&self) -> Vec<YearMonth> {
        let Some((min_year, max_year)) = self.years else {
            return Vec::new();
        };

        (min_year..=max_year)
            .flat_map(|year| (1..=12).map(move |month| (year, month)))
            .filter(|key| !self.months.get(key).copied().unwrap_or(false))
            .map(|(year, month)| YearMonth { year, month })
            .collect()
    }
}
