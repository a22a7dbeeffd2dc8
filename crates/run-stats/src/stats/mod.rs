//! Statistics engine
//!
//! Every query is a pure function from a [`Dataset`](crate::models::Dataset) to a
//! ranked [`Table`]. Rankings go through [`top_n`] and [`bottom_n`], which by
//! default keep every row tied with the last place, so a "top 10" can return
//! more than ten rows.

pub mod queries;
mod table;

pub use queries::*;
pub use table::{Table, Value};

use crate::error::Result;

/// How rows tied with the n-th place are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieMode {
    /// Keep every row tied with the n-th place
    #[default]
    All,
    /// Keep exactly n rows, earlier rows first
    First,
}

/// The `n` largest rows by `column`, then sorted by it in the requested direction
pub fn top_n(table: Table, column: &str, n: usize, ties: TieMode, ascending: bool) -> Result<Table> {
    select(table, column, n, ties, true)?.sort_by(column, ascending)
}

/// The `n` smallest rows by `column`, then sorted by it in the requested direction
pub fn bottom_n(table: Table, column: &str, n: usize, ties: TieMode, ascending: bool) -> Result<Table> {
    select(table, column, n, ties, false)?.sort_by(column, ascending)
}

// Rows whose cell has no sort key (text, missing, NaN) never rank.
fn select(table: Table, column: &str, n: usize, ties: TieMode, largest: bool) -> Result<Table> {
    let idx = table.column_index(column)?;
    let (columns, rows) = table.into_parts();

    let mut ranked: Vec<(f64, Vec<Value>)> = rows
        .into_iter()
        .filter_map(|row| row[idx].sort_key().map(|key| (key, row)))
        .collect();
    ranked.sort_by(|a, b| {
        if largest {
            b.0.total_cmp(&a.0)
        } else {
            a.0.total_cmp(&b.0)
        }
    });

    if ranked.len() > n {
        let keep = match (ties, n) {
            (_, 0) => 0,
            (TieMode::First, _) => n,
            (TieMode::All, _) => {
                let cutoff = ranked[n - 1].0;
                ranked
                    .iter()
                    .take_while(|(key, _)| if largest { *key >= cutoff } else { *key <= cutoff })
                    .count()
            }
        };
        ranked.truncate(keep);
    }

    Ok(Table::from_parts(
        columns,
        ranked.into_iter().map(|(_, row)| row).collect(),
    ))
}

/// Arithmetic mean, `None` for no samples
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (n - 1), `None` below two samples
pub fn sample_std(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    let var = samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    Some(var.sqrt())
}
