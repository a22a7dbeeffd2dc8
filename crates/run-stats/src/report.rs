//! The standard club report
//!
//! A [`ReportContext`] owns everything one report run needs: the dataset, the
//! identities resolved from it, and the charts recorded so far.

use tracing::{info, warn};

use crate::charts::{hours, minutes, round2, ChartRegistry, ChartSpec, ValueTransform};
use crate::error::Result;
use crate::identity::IdentityMap;
use crate::models::Dataset;
use crate::stats::{self, Table};

/// A named query over the dataset
pub type Query = fn(&Dataset) -> Result<Table>;

pub struct ReportContext {
    pub dataset: Dataset,
    pub identity: IdentityMap,
    pub registry: ChartRegistry,
}

impl ReportContext {
    pub fn new(dataset: Dataset) -> Self {
        let identity = IdentityMap::build(&dataset);
        Self {
            dataset,
            identity,
            registry: ChartRegistry::new(),
        }
    }

    /// Run one query and record its chart
    pub fn record(&mut self, spec: &ChartSpec, query: Query) -> Result<()> {
        self.registry
            .record(spec, &self.dataset, &self.identity, query)
    }
}

/// Outcome of [`run_standard_report`]
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    /// Titles of the charts recorded
    pub recorded: Vec<String>,
    /// Title and error of each chart that could not be built
    pub failures: Vec<(String, String)>,
}

impl ReportSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The standard chart set, in render order
pub fn standard_charts() -> Vec<(ChartSpec, Query)> {
    vec![
        (
            ChartSpec::new("Full marathons", ValueTransform::name_value("count"))
                .subtitle("Runs longer than 42 km")
                .formatter("{value} runs"),
            stats::full_marathon as Query,
        ),
        (
            ChartSpec::new("Total distance", ValueTransform::converted("distance", round2))
                .subtitle("All runs")
                .formatter("{value} km"),
            stats::total_distance as Query,
        ),
        (
            ChartSpec::new("Every week", ValueTransform::name_value("weeks"))
                .subtitle("Most weeks with at least one run")
                .formatter("{value} weeks"),
            stats::weekly_consistency as Query,
        ),
        (
            ChartSpec::new("Longest streak", ValueTransform::name_value("streak"))
                .subtitle("Most consecutive weeks with a run")
                .formatter("{value} weeks"),
            stats::longest_week_streak as Query,
        ),
        (
            ChartSpec::new("Pace leaders", ValueTransform::converted("avg_pace", minutes))
                .subtitle("Regular runs, more than 1500 km in total")
                .formatter("{value} min/km")
                .prop("inverse", true),
            stats::pace_leaders as Query,
        ),
        (
            ChartSpec::new("Total time", ValueTransform::converted("time", hours))
                .subtitle("All runs")
                .formatter("{value} h"),
            stats::total_time as Query,
        ),
        (
            ChartSpec::new("Running days", ValueTransform::name_value("days"))
                .subtitle("Distinct days with a run")
                .formatter("{value} days"),
            stats::total_days as Query,
        ),
        (
            ChartSpec::new("Stride length", ValueTransform::converted("stride_length", round2))
                .subtitle("Regular runs, more than 1500 km in total")
                .formatter("{value} m"),
            stats::stride_leaders as Query,
        ),
        (
            ChartSpec::new(
                "Steady months",
                ValueTransform::converted("distance_std", round2),
            )
            .subtitle("Most active months, lowest monthly distance deviation")
            .formatter("{value} km"),
            stats::month_distance_consistency as Query,
        ),
        (
            ChartSpec::new("Steady pace", ValueTransform::converted("pace_std", round2))
                .subtitle("Regular runs, lowest pace deviation")
                .formatter("{value} s"),
            stats::pace_consistency as Query,
        ),
        (
            ChartSpec::new("Monthly distance", ValueTransform::MonthDistance)
                .subtitle("Total distance leaders")
                .formatter("{value} km"),
            stats::monthly_distance_of_leaders as Query,
        ),
        (
            ChartSpec::new("Monthly pace", ValueTransform::MonthPace)
                .subtitle("Pace leaders")
                .formatter("{value} s/km")
                .prop("inverse", true),
            stats::monthly_pace_of_leaders as Query,
        ),
        (
            ChartSpec::new("Club calendar", ValueTransform::calendar("distance"))
                .subtitle("Club distance per day")
                .formatter("{value} km"),
            stats::daily_distance as Query,
        ),
        (
            ChartSpec::new("Pace range", ValueTransform::Candlestick)
                .subtitle("Regular-run pace per month")
                .formatter("{value} s/km"),
            stats::monthly_pace_range as Query,
        ),
    ]
}

/// Record every standard chart, continuing past charts that fail
pub fn run_standard_report(ctx: &mut ReportContext) -> ReportSummary {
    let mut summary = ReportSummary::default();

    for (spec, query) in standard_charts() {
        match ctx.record(&spec, query) {
            Ok(()) => summary.recorded.push(spec.title),
            Err(e) => {
                warn!(chart = %spec.title, error = %e, "chart skipped");
                summary.failures.push((spec.title, e.to_string()));
            }
        }
    }

    info!(
        charts = summary.recorded.len(),
        failed = summary.failures.len(),
        "report built"
    );
    summary
}
