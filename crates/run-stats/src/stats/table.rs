//! Small typed result table shared by queries and chart transforms

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{Result, StatsError};
use crate::models::YearMonth;
use crate::parse::format_duration;

/// One cell of a result table
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Span(Duration),
    Date(NaiveDate),
    Month(YearMonth),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric ordering key; `None` for text, missing and NaN cells
    pub fn sort_key(&self) -> Option<f64> {
        let key = match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Span(d) => d.num_seconds() as f64,
            Value::Date(d) => d.num_days_from_ce() as f64,
            Value::Month(m) => m.ordinal() as f64,
            Value::Text(_) | Value::Missing => return None,
        };
        (!key.is_nan()).then_some(key)
    }

    /// Value as a chart number: spans in seconds, dates and months excluded
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            Value::Span(d) => Some(d.num_seconds() as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_month(&self) -> Option<YearMonth> {
        match self {
            Value::Month(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:.2}", v),
            Value::Span(d) => f.write_str(&format_duration(*d)),
            Value::Date(d) => write!(f, "{}", d),
            Value::Month(m) => write!(f, "{}", m),
            Value::Text(s) => f.write_str(s),
            Value::Missing => f.write_str("-"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Span(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<YearMonth> for Value {
    fn from(v: YearMonth) -> Self {
        Value::Month(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Float).unwrap_or(Value::Missing)
    }
}

/// Named columns and rows of [`Value`]s
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one value per column
    pub fn push(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StatsError::invalid_param(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| StatsError::UnknownColumn(name.to_string()))
    }

    /// Cell at a row index in the named column
    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| &r[idx])
            .ok_or_else(|| StatsError::invalid_param(format!("row {} out of range", row)))
    }

    /// All cells of the named column
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Keep rows whose cell in `column` satisfies the predicate
    pub fn filter(mut self, column: &str, keep: impl Fn(&Value) -> bool) -> Result<Self> {
        let idx = self.column_index(column)?;
        self.rows.retain(|r| keep(&r[idx]));
        Ok(self)
    }

    /// Stable sort by a column; unrankable cells go last
    pub fn sort_by(mut self, column: &str, ascending: bool) -> Result<Self> {
        let idx = self.column_index(column)?;
        self.rows.sort_by(|a, b| {
            match (a[idx].sort_key(), b[idx].sort_key()) {
                (Some(x), Some(y)) => {
                    let ord = x.total_cmp(&y);
                    if ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        Ok(self)
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in &self.columns {
            write!(f, "{:>16}", column)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(16 * self.columns.len()))?;
        for row in &self.rows {
            for value in row {
                write!(f, "{:>16}", value.to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut t = Table::new(&["user_id", "distance"]);
        t.push(vec![Value::Int(1), Value::Float(3.0)]).unwrap();
        t.push(vec![Value::Int(2), Value::Missing]).unwrap();
        t.push(vec![Value::Int(3), Value::Float(1.0)]).unwrap();
        t
    }

    #[test]
    fn test_push_checks_width() {
        let mut t = Table::new(&["a", "b"]);
        assert!(t.push(vec![Value::Int(1)]).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            table().column_index("pace"),
            Err(StatsError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_sort_puts_missing_last() {
        let sorted = table().sort_by("distance", true).unwrap();
        let ids: Vec<i64> = sorted
            .column("user_id")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_i64())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);

        let sorted = table().sort_by("distance", false).unwrap();
        assert_eq!(sorted.value(0, "user_id").unwrap(), &Value::Int(1));
        assert_eq!(sorted.value(2, "user_id").unwrap(), &Value::Int(2));
    }

    #[test]
    fn test_filter() {
        let t = table()
            .filter("distance", |v| v.sort_key().map(|d| d > 2.0).unwrap_or(false))
            .unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(Value::Span(Duration::seconds(90)).sort_key(), Some(90.0));
        assert_eq!(Value::Float(f64::NAN).sort_key(), None);
        assert_eq!(Value::Text("x".to_string()).sort_key(), None);
        assert!(
            Value::Month(YearMonth { year: 2023, month: 1 }).sort_key()
                > Value::Month(YearMonth { year: 2022, month: 12 }).sort_key()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Span(Duration::seconds(3723)).to_string(), "1:02:03");
        assert_eq!(Value::Float(1.005).to_string(), "1.00");
        assert!(table().to_string().contains("distance"));
    }
}
