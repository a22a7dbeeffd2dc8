//! Cell converters for the activity export columns
//!
//! Timestamps, durations, paces and user ids have no safe fallback and fail with
//! [`StatsError::Parse`]. Plain numeric cells fall back to zero.

use chrono::{Duration, NaiveDateTime};

use crate::error::{Result, StatsError};

/// Timestamp layout used by the exports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an `end_time` cell (`YYYY-MM-DD HH:MM:SS`)
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| StatsError::parse(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Parse a duration cell (`H:MM:SS` or `MM:SS`)
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let items: Vec<&str> = raw.trim().split(':').collect();
    if items.len() < 2 || items.len() > 3 {
        return Err(StatsError::parse(format!("invalid duration '{}'", raw)));
    }

    let component = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| StatsError::parse(format!("invalid duration '{}'", raw)))
    };

    let n = items.len();
    let seconds = component(items[n - 1])?;
    let minutes = component(items[n - 2])?;
    let hours = if n == 3 { component(items[0])? } else { 0 };

    Ok(Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
}

/// Parse a pace cell (`M'SS"`), the trailing character of the seconds part is a unit marker
pub fn parse_pace(raw: &str) -> Result<Duration> {
    let invalid = || StatsError::parse(format!("invalid pace '{}'", raw));

    let (minutes, seconds) = raw.trim().split_once('\'').ok_or_else(invalid)?;
    let mut seconds = seconds.trim().chars();
    seconds.next_back().ok_or_else(invalid)?;

    let minutes: i64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: i64 = seconds.as_str().parse().map_err(|_| invalid())?;

    Ok(Duration::minutes(minutes) + Duration::seconds(seconds))
}

/// Parse a user id. Unlike other integer cells there is no fallback.
pub fn parse_user_id(raw: &str) -> Result<i64> {
    let cleaned = strip_grouping(raw);
    cleaned
        .parse::<i64>()
        .or_else(|_| {
            // Numeric spreadsheet cells may come through as "12345.0"
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64)
                .ok_or(())
        })
        .map_err(|_| StatsError::parse(format!("invalid user id '{}'", raw)))
}

/// Parse an integer cell, `0` when the cell is not a number
pub fn parse_int(raw: &str) -> i64 {
    let cleaned = strip_grouping(raw);
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.fract() == 0.0)
                .map(|v| v as i64)
        })
        .unwrap_or(0)
}

/// Parse a float cell, `0.0` when the cell is not a number
pub fn parse_float(raw: &str) -> f64 {
    strip_grouping(raw).parse::<f64>().unwrap_or(0.0)
}

/// Format a span as `H:MM:SS`, or `M:SS` below one hour
pub fn format_duration(span: Duration) -> String {
    let total = span.num_seconds();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a span as a pace (`M'SS"`)
pub fn format_pace(span: Duration) -> String {
    let total = span.num_seconds();
    format!("{}'{:02}\"", total / 60, total % 60)
}

// Commas separate thousands in the exports
fn strip_grouping(raw: &str) -> String {
    raw.trim().replace(',', "")
}
