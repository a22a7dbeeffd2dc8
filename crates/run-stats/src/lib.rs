//! Consolidate running club activity exports and build chart-ready statistics.

pub mod calendar;
pub mod charts;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod loader;
pub mod models;
pub mod parse;
pub mod report;
pub mod stats;
pub mod storage;

pub use error::{Result, StatsError};
