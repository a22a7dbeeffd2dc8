//! Data models for activity exports and the consolidated dataset

mod activity;
mod dataset;

pub use activity::{ActivityRecord, RunType, YearMonth, REGULAR_PACE_LIMIT_SECS};
pub use dataset::Dataset;
