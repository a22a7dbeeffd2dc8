//! Table to chart-series transforms

use std::collections::{BTreeMap, BTreeSet};

use super::{ChartType, Series, YValues};
use crate::error::{Result, StatsError};
use crate::identity::IdentityMap;
use crate::models::YearMonth;
use crate::stats::{Table, Value};

/// Cell to chart number conversion
pub type Convert = fn(&Value) -> Option<f64>;

/// How a query table becomes `x_values` and `y_values`
#[derive(Debug, Clone)]
pub enum ValueTransform {
    /// One bar per row: resolved user name against a value column
    NameValue {
        column: String,
        convert: Option<Convert>,
    },
    /// Per-user monthly distance lines, zero where a user has no runs
    MonthDistance,
    /// Per-user monthly pace lines, gaps where a user has no runs
    MonthPace,
    /// One value per calendar date
    Calendar { column: String },
    /// `[open, close, low, high]` per label
    Candlestick,
}

impl ValueTransform {
    pub fn name_value(column: &str) -> Self {
        ValueTransform::NameValue {
            column: column.to_string(),
            convert: None,
        }
    }

    pub fn converted(column: &str, convert: Convert) -> Self {
        ValueTransform::NameValue {
            column: column.to_string(),
            convert: Some(convert),
        }
    }

    pub fn calendar(column: &str) -> Self {
        ValueTransform::Calendar {
            column: column.to_string(),
        }
    }

    /// Chart type a [`ChartSpec`](super::ChartSpec) gets unless it says otherwise
    pub fn default_chart_type(&self) -> ChartType {
        match self {
            ValueTransform::NameValue { .. } => ChartType::RankBar,
            ValueTransform::MonthDistance | ValueTransform::MonthPace => ChartType::MultiLine,
            ValueTransform::Calendar { .. } => ChartType::Calendar,
            ValueTransform::Candlestick => ChartType::Candlestick,
        }
    }

    pub fn apply(&self, table: &Table, identity: &IdentityMap) -> Result<(Vec<String>, YValues)> {
        match self {
            ValueTransform::NameValue { column, convert } => {
                name_value(table, identity, column, *convert)
            }
            ValueTransform::MonthDistance => month_series(table, identity, "distance", Some(0.0)),
            ValueTransform::MonthPace => month_series(table, identity, "avg_pace", None),
            ValueTransform::Calendar { column } => calendar(table, column),
            ValueTransform::Candlestick => candlestick(table),
        }
    }
}

/// Seconds to hours, two decimals
pub fn hours(value: &Value) -> Option<f64> {
    value.as_f64().map(|s| (s / 36.0).round() / 100.0)
}

/// Seconds to minutes, two decimals
pub fn minutes(value: &Value) -> Option<f64> {
    value.as_f64().map(|s| (s / 0.6).round() / 100.0)
}

/// Round to two decimals
pub fn round2(value: &Value) -> Option<f64> {
    value.as_f64().map(|v| (v * 100.0).round() / 100.0)
}

fn user_id(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| StatsError::invalid_param(format!("expected a user id, got '{}'", value)))
}

fn name_value(
    table: &Table,
    identity: &IdentityMap,
    column: &str,
    convert: Option<Convert>,
) -> Result<(Vec<String>, YValues)> {
    let id_idx = table.column_index("user_id")?;
    let value_idx = table.column_index(column)?;

    let mut x = Vec::with_capacity(table.len());
    let mut y = Vec::with_capacity(table.len());
    for row in table.rows() {
        let name = identity.resolve(user_id(&row[id_idx])?)?;
        x.push(name.to_string());
        y.push(match convert {
            Some(convert) => convert(&row[value_idx]),
            None => row[value_idx].as_f64(),
        });
    }

    Ok((x, YValues::Single(y)))
}

fn month_series(
    table: &Table,
    identity: &IdentityMap,
    column: &str,
    fill: Option<f64>,
) -> Result<(Vec<String>, YValues)> {
    let id_idx = table.column_index("user_id")?;
    let month_idx = table.column_index("month")?;
    let value_idx = table.column_index(column)?;

    let mut months: BTreeSet<YearMonth> = BTreeSet::new();
    let mut users: BTreeMap<i64, BTreeMap<YearMonth, Option<f64>>> = BTreeMap::new();
    for row in table.rows() {
        let month = row[month_idx].as_month().ok_or_else(|| {
            StatsError::invalid_param(format!("expected a month, got '{}'", row[month_idx]))
        })?;
        months.insert(month);
        users
            .entry(user_id(&row[id_idx])?)
            .or_default()
            .insert(month, row[value_idx].as_f64());
    }

    let mut series = Vec::with_capacity(users.len());
    for (id, values) in users {
        series.push(Series {
            name: identity.resolve(id)?.to_string(),
            values: months
                .iter()
                .map(|m| values.get(m).copied().unwrap_or(fill))
                .collect(),
        });
    }

    let x = months.iter().map(YearMonth::short_label).collect();
    Ok((x, YValues::Multi(series)))
}

fn calendar(table: &Table, column: &str) -> Result<(Vec<String>, YValues)> {
    let date_idx = table.column_index("date")?;
    let value_idx = table.column_index(column)?;

    let mut x = Vec::with_capacity(table.len());
    let mut y = Vec::with_capacity(table.len());
    for row in table.rows() {
        let date = row[date_idx].as_date().ok_or_else(|| {
            StatsError::invalid_param(format!("expected a date, got '{}'", row[date_idx]))
        })?;
        x.push(date.format("%Y-%m-%d").to_string());
        y.push(row[value_idx].as_f64());
    }

    Ok((x, YValues::Single(y)))
}

fn candlestick(table: &Table) -> Result<(Vec<String>, YValues)> {
    let label_idx = 0;
    let idx = [
        table.column_index("open")?,
        table.column_index("close")?,
        table.column_index("low")?,
        table.column_index("high")?,
    ];

    let mut x = Vec::with_capacity(table.len());
    let mut y = Vec::with_capacity(table.len());
    for row in table.rows() {
        let label = match &row[label_idx] {
            Value::Month(m) => m.short_label(),
            other => other.to_string(),
        };

        let mut point = [0.0; 4];
        for (slot, &i) in point.iter_mut().zip(idx.iter()) {
            *slot = row[i].as_f64().ok_or_else(|| {
                StatsError::invalid_param(format!("missing value for '{}'", label))
            })?;
        }

        x.push(label);
        y.push(point);
    }

    Ok((x, YValues::Ohlc(y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityRecord, Dataset, RunType};
    use chrono::{Duration, NaiveDate};

    fn identity(users: &[(i64, &str)]) -> IdentityMap {
        let records = users
            .iter()
            .map(|(id, name)| ActivityRecord {
                end_time: NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
                status: String::new(),
                user_id: *id,
                user_name: name.to_string(),
                gender: String::new(),
                distance: 1.0,
                duration: Duration::seconds(300),
                run_type: RunType::Outdoor,
                pace: Duration::seconds(300),
                cadence: 0,
                stride_length: 0.0,
                year: 2023,
                month: YearMonth { year: 2023, month: 1 },
                week_no: 1,
            })
            .collect();
        IdentityMap::build(&Dataset::new(records))
    }

    fn month(year: i32, month: u32) -> Value {
        Value::Month(YearMonth { year, month })
    }

    #[test]
    fn test_name_value_resolves_names() {
        let mut t = Table::new(&["user_id", "time"]);
        t.push(vec![Value::Int(2), Value::Span(Duration::seconds(5400))]).unwrap();
        t.push(vec![Value::Int(1), Value::Span(Duration::seconds(7200))]).unwrap();
        let ids = identity(&[(1, "Ann"), (2, "Bo")]);

        let (x, y) = ValueTransform::name_value("time").apply(&t, &ids).unwrap();
        assert_eq!(x, vec!["Bo", "Ann"]);
        assert_eq!(y, YValues::Single(vec![Some(5400.0), Some(7200.0)]));

        let (_, y) = ValueTransform::converted("time", hours).apply(&t, &ids).unwrap();
        assert_eq!(y, YValues::Single(vec![Some(1.5), Some(2.0)]));
    }

    #[test]
    fn test_name_value_unknown_user() {
        let mut t = Table::new(&["user_id", "count"]);
        t.push(vec![Value::Int(9), Value::Int(1)]).unwrap();
        let err = ValueTransform::name_value("count")
            .apply(&t, &identity(&[(1, "Ann")]))
            .unwrap_err();
        assert!(matches!(err, StatsError::UnknownUser(9)));
    }

    #[test]
    fn test_month_pace_gaps_align_with_union_of_months() {
        let mut t = Table::new(&["user_id", "month", "avg_pace"]);
        let pace = |s| Value::Span(Duration::seconds(s));
        t.push(vec![Value::Int(1), month(2023, 1), pace(300)]).unwrap();
        t.push(vec![Value::Int(1), month(2023, 3), pace(290)]).unwrap();
        t.push(vec![Value::Int(2), month(2022, 12), pace(330)]).unwrap();
        t.push(vec![Value::Int(2), month(2023, 1), pace(320)]).unwrap();
        let ids = identity(&[(1, "Ann"), (2, "Bo")]);

        let (x, y) = ValueTransform::MonthPace.apply(&t, &ids).unwrap();
        assert_eq!(x, vec!["22-12", "23-01", "23-03"]);
        assert_eq!(
            y,
            YValues::Multi(vec![
                Series {
                    name: "Ann".to_string(),
                    values: vec![None, Some(300.0), Some(290.0)],
                },
                Series {
                    name: "Bo".to_string(),
                    values: vec![Some(330.0), Some(320.0), None],
                },
            ])
        );
    }

    #[test]
    fn test_month_distance_fills_zero() {
        let mut t = Table::new(&["user_id", "month", "distance"]);
        t.push(vec![Value::Int(1), month(2023, 1), Value::Float(40.0)]).unwrap();
        t.push(vec![Value::Int(2), month(2023, 2), Value::Float(12.5)]).unwrap();
        let ids = identity(&[(1, "Ann"), (2, "Bo")]);

        let (x, y) = ValueTransform::MonthDistance.apply(&t, &ids).unwrap();
        assert_eq!(x, vec!["23-01", "23-02"]);
        let YValues::Multi(series) = y else {
            panic!("expected multi series");
        };
        assert_eq!(series[0].values, vec![Some(40.0), Some(0.0)]);
        assert_eq!(series[1].values, vec![Some(0.0), Some(12.5)]);
    }

    #[test]
    fn test_empty_table_gives_empty_series() {
        let t = Table::new(&["user_id", "month", "avg_pace"]);
        let (x, y) = ValueTransform::MonthPace.apply(&t, &IdentityMap::default()).unwrap();
        assert!(x.is_empty());
        assert_eq!(y, YValues::Multi(vec![]));
    }

    #[test]
    fn test_calendar() {
        let mut t = Table::new(&["date", "distance"]);
        t.push(vec![
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()),
            Value::Float(21.1),
        ])
        .unwrap();
        let (x, y) = ValueTransform::calendar("distance")
            .apply(&t, &IdentityMap::default())
            .unwrap();
        assert_eq!(x, vec!["2023-01-02"]);
        assert_eq!(y, YValues::Single(vec![Some(21.1)]));
    }

    #[test]
    fn test_candlestick() {
        let mut t = Table::new(&["month", "open", "close", "low", "high"]);
        let s = |v| Value::Span(Duration::seconds(v));
        t.push(vec![month(2023, 1), s(320), s(300), s(280), s(330)]).unwrap();
        let (x, y) = ValueTransform::Candlestick
            .apply(&t, &IdentityMap::default())
            .unwrap();
        assert_eq!(x, vec!["23-01"]);
        assert_eq!(y, YValues::Ohlc(vec![[320.0, 300.0, 280.0, 330.0]]));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(hours(&Value::Span(Duration::seconds(5400))), Some(1.5));
        assert_eq!(minutes(&Value::Span(Duration::seconds(330))), Some(5.5));
        assert_eq!(round2(&Value::Float(1.23456)), Some(1.23));
        assert_eq!(round2(&Value::Missing), None);
    }
}
