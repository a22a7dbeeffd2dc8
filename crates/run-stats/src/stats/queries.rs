//! Named queries over a dataset
//!
//! Grouping is always by user id in ascending order, so ties keep a stable,
//! reproducible order. Queries that rank "regular" runs only consider outdoor
//! runs at ten minutes per kilometer or faster.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use super::{bottom_n, mean, sample_std, top_n, Table, TieMode, Value};
use crate::error::Result;
use crate::models::{Dataset, YearMonth};

/// Distance above which a run counts as a full marathon (km)
pub const FULL_MARATHON_KM: f64 = 42.0;

/// Minimum summed regular-run distance for pace and stride rankings (exclusive, km)
pub const MIN_RANKED_DISTANCE_KM: f64 = 1500.0;

/// Stride lengths outside `(0, 1.8)` meters are treated as sensor noise
pub const MAX_STRIDE_M: f64 = 1.8;

const LEADERBOARD_SIZE: usize = 10;

#[derive(Default)]
struct TimeDistance {
    seconds: i64,
    distance: f64,
}

/// Runs longer than a marathon, counted per user
pub fn full_marathon(dataset: &Dataset) -> Result<Table> {
    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for r in dataset.iter().filter(|r| r.distance > FULL_MARATHON_KM) {
        *counts.entry(r.user_id).or_default() += 1;
    }

    let mut table = Table::new(&["user_id", "count"]);
    for (user_id, count) in counts {
        table.push(vec![user_id.into(), count.into()])?;
    }
    top_n(table, "count", LEADERBOARD_SIZE, TieMode::All, true)
}

/// Total distance per user
pub fn total_distance(dataset: &Dataset) -> Result<Table> {
    let mut sums: BTreeMap<i64, f64> = BTreeMap::new();
    for r in dataset.iter() {
        *sums.entry(r.user_id).or_default() += r.distance;
    }

    let mut table = Table::new(&["user_id", "distance"]);
    for (user_id, distance) in sums {
        table.push(vec![user_id.into(), distance.into()])?;
    }
    top_n(table, "distance", LEADERBOARD_SIZE, TieMode::All, true)
}

/// Users who ran in the most distinct weeks (all tied leaders)
pub fn weekly_consistency(dataset: &Dataset) -> Result<Table> {
    let mut weeks: BTreeMap<i64, BTreeSet<u32>> = BTreeMap::new();
    for r in dataset.iter() {
        weeks.entry(r.user_id).or_default().insert(r.week_no);
    }

    let mut table = Table::new(&["user_id", "weeks"]);
    for (user_id, w) in weeks {
        table.push(vec![user_id.into(), w.len().into()])?;
    }
    top_n(table, "weeks", 1, TieMode::All, true)
}

/// Longest unbroken run of consecutive weeks with at least one run, per user
pub fn longest_week_streak(dataset: &Dataset) -> Result<Table> {
    let mut weeks: BTreeMap<i64, BTreeSet<u32>> = BTreeMap::new();
    for r in dataset.iter() {
        weeks.entry(r.user_id).or_default().insert(r.week_no);
    }

    let mut table = Table::new(&["user_id", "streak"]);
    for (user_id, w) in weeks {
        table.push(vec![user_id.into(), longest_streak(&w).into()])?;
    }
    top_n(table, "streak", LEADERBOARD_SIZE, TieMode::All, true)
}

fn longest_streak(weeks: &BTreeSet<u32>) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<u32> = None;
    for &week in weeks {
        current = match previous {
            Some(p) if p + 1 == week => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(week);
    }
    longest
}

/// Fastest average pace over regular runs, slowest of the fast first
pub fn pace_leaders(dataset: &Dataset) -> Result<Table> {
    let mut totals: BTreeMap<i64, TimeDistance> = BTreeMap::new();
    for r in dataset.regular_runs() {
        let t = totals.entry(r.user_id).or_default();
        t.seconds += r.duration.num_seconds();
        t.distance += r.distance;
    }

    let mut table = Table::new(&["user_id", "time", "distance", "avg_pace"]);
    for (user_id, t) in totals {
        if t.distance <= MIN_RANKED_DISTANCE_KM {
            continue;
        }
        table.push(vec![
            user_id.into(),
            Duration::seconds(t.seconds).into(),
            t.distance.into(),
            average_pace(t.seconds, t.distance).into(),
        ])?;
    }
    if table.is_empty() {
        return Ok(table);
    }

    bottom_n(table, "avg_pace", LEADERBOARD_SIZE, TieMode::All, false)
}

/// Total running time per user
pub fn total_time(dataset: &Dataset) -> Result<Table> {
    let mut sums: BTreeMap<i64, Duration> = BTreeMap::new();
    for r in dataset.iter() {
        let total = sums.entry(r.user_id).or_insert_with(Duration::zero);
        *total = *total + r.duration;
    }

    let mut table = Table::new(&["user_id", "time"]);
    for (user_id, time) in sums {
        table.push(vec![user_id.into(), time.into()])?;
    }
    top_n(table, "time", LEADERBOARD_SIZE, TieMode::All, true)
}

/// Distinct days with at least one run, per user
pub fn total_days(dataset: &Dataset) -> Result<Table> {
    let mut days: BTreeMap<i64, BTreeSet<NaiveDate>> = BTreeMap::new();
    for r in dataset.iter() {
        days.entry(r.user_id).or_default().insert(r.date());
    }

    let mut table = Table::new(&["user_id", "days"]);
    for (user_id, d) in days {
        table.push(vec![user_id.into(), d.len().into()])?;
    }
    top_n(table, "days", LEADERBOARD_SIZE, TieMode::All, true)
}

/// Longest mean stride over regular runs with a plausible stride
pub fn stride_leaders(dataset: &Dataset) -> Result<Table> {
    let mut groups: BTreeMap<i64, (Vec<f64>, f64)> = BTreeMap::new();
    for r in dataset
        .regular_runs()
        .filter(|r| r.stride_length > 0.0 && r.stride_length < MAX_STRIDE_M)
    {
        let (strides, distance) = groups.entry(r.user_id).or_default();
        strides.push(r.stride_length);
        *distance += r.distance;
    }

    let mut table = Table::new(&["user_id", "stride_length", "distance"]);
    for (user_id, (strides, distance)) in groups {
        if distance <= MIN_RANKED_DISTANCE_KM {
            continue;
        }
        table.push(vec![user_id.into(), mean(&strides).into(), distance.into()])?;
    }
    top_n(table, "stride_length", LEADERBOARD_SIZE, TieMode::All, true)
}

/// Steadiest month-to-month distance among users active in the most months
pub fn month_distance_consistency(dataset: &Dataset) -> Result<Table> {
    let mut monthly: BTreeMap<i64, BTreeMap<YearMonth, f64>> = BTreeMap::new();
    for r in dataset.regular_runs() {
        *monthly
            .entry(r.user_id)
            .or_default()
            .entry(r.month)
            .or_default() += r.distance;
    }

    let mut table = Table::new(&["user_id", "months", "distance_std"]);
    for (user_id, months) in monthly {
        let sums: Vec<f64> = months.values().copied().collect();
        table.push(vec![
            user_id.into(),
            sums.len().into(),
            sample_std(&sums).into(),
        ])?;
    }

    let most_months = top_n(table, "months", 1, TieMode::All, true)?;
    bottom_n(most_months, "distance_std", LEADERBOARD_SIZE, TieMode::All, false)
}

/// Steadiest pace (seconds standard deviation) over regular runs
pub fn pace_consistency(dataset: &Dataset) -> Result<Table> {
    let mut groups: BTreeMap<i64, (Vec<f64>, f64)> = BTreeMap::new();
    for r in dataset.regular_runs() {
        let (paces, distance) = groups.entry(r.user_id).or_default();
        paces.push(r.pace.num_seconds() as f64);
        *distance += r.distance;
    }

    let mut table = Table::new(&["user_id", "distance", "pace_std"]);
    for (user_id, (paces, distance)) in groups {
        if distance <= MIN_RANKED_DISTANCE_KM {
            continue;
        }
        table.push(vec![user_id.into(), distance.into(), sample_std(&paces).into()])?;
    }
    bottom_n(table, "pace_std", LEADERBOARD_SIZE, TieMode::All, false)
}

/// Monthly distance of each total-distance leader, one row per user and month
pub fn monthly_distance_of_leaders(dataset: &Dataset) -> Result<Table> {
    let leaders = user_ids(&total_distance(dataset)?)?;

    let mut monthly: BTreeMap<(i64, YearMonth), f64> = BTreeMap::new();
    for r in dataset.iter().filter(|r| leaders.contains(&r.user_id)) {
        *monthly.entry((r.user_id, r.month)).or_default() += r.distance;
    }

    let mut table = Table::new(&["user_id", "month", "distance"]);
    for ((user_id, month), distance) in monthly {
        table.push(vec![user_id.into(), month.into(), distance.into()])?;
    }
    Ok(table)
}

/// Monthly average regular-run pace of each pace leader, one row per user and month
pub fn monthly_pace_of_leaders(dataset: &Dataset) -> Result<Table> {
    let leaders = user_ids(&pace_leaders(dataset)?)?;

    let mut monthly: BTreeMap<(i64, YearMonth), TimeDistance> = BTreeMap::new();
    for r in dataset.regular_runs().filter(|r| leaders.contains(&r.user_id)) {
        let t = monthly.entry((r.user_id, r.month)).or_default();
        t.seconds += r.duration.num_seconds();
        t.distance += r.distance;
    }

    let mut table = Table::new(&["user_id", "month", "avg_pace"]);
    for ((user_id, month), t) in monthly {
        if t.distance <= 0.0 {
            continue;
        }
        table.push(vec![
            user_id.into(),
            month.into(),
            average_pace(t.seconds, t.distance).into(),
        ])?;
    }
    Ok(table)
}

/// Club distance per calendar day
pub fn daily_distance(dataset: &Dataset) -> Result<Table> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in dataset.iter() {
        *daily.entry(r.date()).or_default() += r.distance;
    }

    let mut table = Table::new(&["date", "distance"]);
    for (date, distance) in daily {
        table.push(vec![date.into(), distance.into()])?;
    }
    Ok(table)
}

/// Open/close/low/high of regular-run pace per month, in run order
pub fn monthly_pace_range(dataset: &Dataset) -> Result<Table> {
    let mut months: BTreeMap<YearMonth, Vec<Duration>> = BTreeMap::new();
    for r in dataset.regular_runs() {
        months.entry(r.month).or_default().push(r.pace);
    }

    let mut table = Table::new(&["month", "open", "close", "low", "high"]);
    for (month, paces) in months {
        let (Some(open), Some(close), Some(low), Some(high)) = (
            paces.first(),
            paces.last(),
            paces.iter().min(),
            paces.iter().max(),
        ) else {
            continue;
        };
        table.push(vec![
            month.into(),
            (*open).into(),
            (*close).into(),
            (*low).into(),
            (*high).into(),
        ])?;
    }
    Ok(table)
}

/// Average pace truncated to whole seconds
fn average_pace(total_seconds: i64, distance: f64) -> Duration {
    Duration::seconds((total_seconds as f64 / distance) as i64)
}

fn user_ids(table: &Table) -> Result<BTreeSet<i64>> {
    Ok(table
        .column("user_id")?
        .into_iter()
        .filter_map(Value::as_i64)
        .collect())
}
