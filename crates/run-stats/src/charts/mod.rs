//! Chart data records
//!
//! A query table becomes a [`ChartData`] through a [`ChartSpec`]: the spec
//! names the chart and picks a [`ValueTransform`] that turns rows into axis
//! values. [`ChartRegistry::record`] runs a query, builds its chart and keeps
//! it, in the order charts should be rendered.

mod transforms;

pub use transforms::{hours, minutes, round2, Convert, ValueTransform};

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::identity::IdentityMap;
use crate::models::Dataset;
use crate::stats::Table;

/// Extra chart attributes, serialized next to the fixed fields
pub type Props = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    RankBar,
    MultiLine,
    Calendar,
    Candlestick,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::RankBar => "rank_bar",
            ChartType::MultiLine => "multi_line",
            ChartType::Calendar => "calendar",
            ChartType::Candlestick => "candlestick",
        }
    }
}

/// A named line of a multi-series chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum YValues {
    Single(Vec<Option<f64>>),
    /// One series per user, each aligned to `x_values`
    Multi(Vec<Series>),
    /// `[open, close, low, high]`
    Ohlc(Vec<[f64; 4]>),
}

/// One chart ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub subtitle: String,
    /// Value label hint for the renderer, passed through as-is
    pub formatter: String,
    pub chart_type: ChartType,
    pub x_values: Vec<String>,
    pub y_values: YValues,
    #[serde(flatten)]
    pub props: Props,
}

/// Presentation of one query's result
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub subtitle: String,
    pub formatter: String,
    pub chart_type: ChartType,
    pub transform: ValueTransform,
    pub props: Props,
}

impl ChartSpec {
    pub fn new(title: &str, transform: ValueTransform) -> Self {
        Self {
            title: title.to_string(),
            subtitle: String::new(),
            formatter: String::new(),
            chart_type: transform.default_chart_type(),
            transform,
            props: Props::new(),
        }
    }

    pub fn subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = subtitle.to_string();
        self
    }

    pub fn formatter(mut self, formatter: &str) -> Self {
        self.formatter = formatter.to_string();
        self
    }

    pub fn chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }

    pub fn prop(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }
}

/// What a query hands to the builder: a table, optionally with props
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub table: Table,
    pub props: Props,
}

impl From<Table> for QueryOutput {
    fn from(table: Table) -> Self {
        Self {
            table,
            props: Props::new(),
        }
    }
}

impl From<(Table, Props)> for QueryOutput {
    fn from((table, props): (Table, Props)) -> Self {
        Self { table, props }
    }
}

/// Builds chart records against one dataset's identities and date range
pub struct ChartBuilder<'a> {
    identity: &'a IdentityMap,
    date_range: Option<(NaiveDate, NaiveDate)>,
}

impl<'a> ChartBuilder<'a> {
    pub fn new(identity: &'a IdentityMap, date_range: Option<(NaiveDate, NaiveDate)>) -> Self {
        Self {
            identity,
            date_range,
        }
    }

    pub fn build(&self, spec: &ChartSpec, output: QueryOutput) -> Result<ChartData> {
        let (x_values, y_values) = spec.transform.apply(&output.table, self.identity)?;

        let mut props = spec.props.clone();
        props.extend(output.props);

        Ok(ChartData {
            title: spec.title.clone(),
            subtitle: self.annotate(&spec.subtitle),
            formatter: spec.formatter.clone(),
            chart_type: spec.chart_type,
            x_values,
            y_values,
            props,
        })
    }

    fn annotate(&self, subtitle: &str) -> String {
        match self.date_range {
            Some((start, end)) if subtitle.is_empty() => format!("{} ~ {}", start, end),
            Some((start, end)) => format!("{} ({} ~ {})", subtitle, start, end),
            None => subtitle.to_string(),
        }
    }
}

/// Charts in render order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ChartRegistry {
    charts: Vec<ChartData>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a query and append the chart built from its result
    ///
    /// Nothing is appended when the query or the transform fails.
    pub fn record<F, O>(
        &mut self,
        spec: &ChartSpec,
        dataset: &Dataset,
        identity: &IdentityMap,
        query: F,
    ) -> Result<()>
    where
        F: FnOnce(&Dataset) -> Result<O>,
        O: Into<QueryOutput>,
    {
        let started = Instant::now();
        let output: QueryOutput = query(dataset)?.into();
        debug!(
            chart = %spec.title,
            rows = output.table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query finished"
        );

        let chart = ChartBuilder::new(identity, dataset.date_range()).build(spec, output)?;
        self.push(chart);
        Ok(())
    }

    pub fn push(&mut self, chart: ChartData) {
        self.charts.push(chart);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartData> {
        self.charts.iter()
    }

    pub fn charts(&self) -> &[ChartData] {
        &self.charts
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }

    /// All charts as a pretty JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::models::{ActivityRecord, RunType, YearMonth};
    use crate::stats::Value;
    use chrono::Duration;

    fn dataset() -> Dataset {
        let record = |day: u32, id: i64, name: &str| {
            let date = NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
            ActivityRecord {
                end_time: date.and_hms_opt(8, 0, 0).unwrap(),
                status: String::new(),
                user_id: id,
                user_name: name.to_string(),
                gender: String::new(),
                distance: 5.0,
                duration: Duration::seconds(1500),
                run_type: RunType::Outdoor,
                pace: Duration::seconds(300),
                cadence: 0,
                stride_length: 0.0,
                year: 2023,
                month: YearMonth::of(date),
                week_no: 1,
            }
        };
        Dataset::new(vec![record(1, 1, "Ann"), record(31, 2, "Bo")])
    }

    fn counts(_: &Dataset) -> Result<Table> {
        let mut t = Table::new(&["user_id", "count"]);
        t.push(vec![Value::Int(2), Value::Int(3)])?;
        Ok(t)
    }

    #[test]
    fn test_record_appends_in_order() {
        let ds = dataset();
        let ids = IdentityMap::build(&ds);
        let mut registry = ChartRegistry::new();

        let spec = ChartSpec::new("Marathons", ValueTransform::name_value("count"))
            .subtitle("runs over 42 km")
            .formatter("{value} runs");
        registry.record(&spec, &ds, &ids, counts).unwrap();
        registry
            .record(&ChartSpec::new("Second", ValueTransform::name_value("count")), &ds, &ids, counts)
            .unwrap();

        assert_eq!(registry.len(), 2);
        let chart = &registry.charts()[0];
        assert_eq!(chart.title, "Marathons");
        assert_eq!(chart.subtitle, "runs over 42 km (2023-01-01 ~ 2023-01-31)");
        assert_eq!(chart.chart_type, ChartType::RankBar);
        assert_eq!(chart.x_values, vec!["Bo"]);
        assert_eq!(registry.charts()[1].title, "Second");
    }

    #[test]
    fn test_failed_query_appends_nothing() {
        let ds = dataset();
        let ids = IdentityMap::build(&ds);
        let mut registry = ChartRegistry::new();
        let spec = ChartSpec::new("Broken", ValueTransform::name_value("count"));

        let result = registry.record(&spec, &ds, &ids, |_| -> Result<Table> {
            Err(StatsError::invalid_param("boom"))
        });
        assert!(result.is_err());

        // Transform failure: column missing from the table
        let result = registry.record(&spec, &ds, &ids, |_| Ok(Table::new(&["user_id"])));
        assert!(matches!(result, Err(StatsError::UnknownColumn(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_props_merge_and_flatten() {
        let ds = dataset();
        let ids = IdentityMap::build(&ds);
        let mut registry = ChartRegistry::new();
        let spec = ChartSpec::new("Props", ValueTransform::name_value("count"))
            .prop("color", "#c23531")
            .prop("limit", 10);

        registry
            .record(&spec, &ds, &ids, |d| {
                let mut props = Props::new();
                props.insert("limit".to_string(), serde_json::json!(1));
                Ok((counts(d)?, props))
            })
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&registry.to_json().unwrap()).unwrap();
        let chart = &json[0];
        assert_eq!(chart["color"], "#c23531");
        assert_eq!(chart["limit"], 1);
        assert_eq!(chart["chart_type"], "rank_bar");
        assert_eq!(chart["y_values"], serde_json::json!([3.0]));
    }

    #[test]
    fn test_subtitle_without_date_range() {
        let ids = IdentityMap::default();
        let builder = ChartBuilder::new(&ids, None);
        let chart = builder
            .build(
                &ChartSpec::new("Empty", ValueTransform::name_value("count")).subtitle("none"),
                Table::new(&["user_id", "count"]).into(),
            )
            .unwrap();
        assert_eq!(chart.subtitle, "none");
        assert_eq!(chart.y_values, YValues::Single(vec![]));
    }

    #[test]
    fn test_multi_line_json_shape() {
        let chart = ChartData {
            title: "t".to_string(),
            subtitle: String::new(),
            formatter: String::new(),
            chart_type: ChartType::MultiLine,
            x_values: vec!["23-01".to_string()],
            y_values: YValues::Multi(vec![Series {
                name: "Ann".to_string(),
                values: vec![None],
            }]),
            props: Props::new(),
        };
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["chart_type"], "multi_line");
        assert_eq!(json["y_values"][0]["name"], "Ann");
        assert!(json["y_values"][0]["values"][0].is_null());
    }
}
