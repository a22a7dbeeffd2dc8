use std::path::PathBuf;

use crate::calendar::DEFAULT_HORIZON_YEARS;
use crate::error::{Result, StatsError};

/// Default data directory name
const DATA_DIR_NAME: &str = "run-stats";

/// File name of the consolidated dataset cache
const CACHE_FILE_NAME: &str = "dataset.parquet";

/// Static parameters for loading period files
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Leading rows before the first record (banner rows plus the column header)
    pub header_rows: usize,
    /// Spreadsheet extensions picked up when scanning a directory
    pub extensions: Vec<String>,
    /// Load only the first period file
    pub debug: bool,
    /// Years covered by the week-number calendar
    pub calendar_horizon_years: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_rows: 8,
            extensions: vec!["xlsx".to_string(), "xls".to_string()],
            debug: false,
            calendar_horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl LoadOptions {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn header_rows(mut self, rows: usize) -> Self {
        self.header_rows = rows;
        self
    }

    /// Whether a file extension names a period spreadsheet
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Get the data directory path for the dataset cache
/// Returns ~/.local/share/run-stats on Unix, ~/Library/Application Support/run-stats on macOS
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or_else(|| StatsError::invalid_param("Could not determine data directory"))
}

/// Default location of the consolidated dataset cache
pub fn default_cache_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(CACHE_FILE_NAME))
}
