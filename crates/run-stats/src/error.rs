use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for run-stats
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Unknown user: {0}")]
    UnknownUser(i64),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Date {0} is outside the calendar table")]
    CalendarRange(NaiveDate),

    #[error("No activity records found in {0}")]
    EmptyDataset(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Create a parse error from a message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a spreadsheet error from a message
    pub fn sheet(msg: impl Into<String>) -> Self {
        Self::Sheet(msg.into())
    }

    /// Create a cache error from a message
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create an invalid parameter error from a message
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Render an error for the command line, adding a hint where one helps.
pub fn format_user_error(err: &StatsError) -> String {
    match err {
        StatsError::Parse(_) => format!(
            "{}\nThe export may have a different column layout; check the header row count.",
            err
        ),
        StatsError::EmptyDataset(_) => format!(
            "{}\nExpected period files named like 'club_20230101-0131.xlsx'.",
            err
        ),
        StatsError::CalendarRange(_) => format!(
            "{}\nThe dataset spans more than the calendar horizon.",
            err
        ),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatsError::Parse("bad timestamp '2023-13-01'".to_string());
        assert_eq!(err.to_string(), "Parse error: bad timestamp '2023-13-01'");
    }

    #[test]
    fn test_unknown_user_error() {
        let err = StatsError::UnknownUser(42);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_calendar_range_error() {
        let err = StatsError::CalendarRange(NaiveDate::from_ymd_opt(2060, 1, 1).unwrap());
        assert!(err.to_string().contains("2060-01-01"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(StatsError::parse("x"), StatsError::Parse(_)));
        assert!(matches!(StatsError::sheet("x"), StatsError::Sheet(_)));
        assert!(matches!(StatsError::cache("x"), StatsError::Cache(_)));
        assert!(matches!(
            StatsError::invalid_param("x"),
            StatsError::InvalidParameter(_)
        ));
    }

    #[test]
    fn test_format_user_error_adds_hint() {
        let err = StatsError::EmptyDataset("data/".to_string());
        let msg = format_user_error(&err);
        assert!(msg.contains("data/"));
        assert!(msg.contains("20230101-0131"));
    }
}
