//! Storage for the consolidated dataset
//!
//! Loading and validating a few years of period spreadsheets is slow, so a
//! loaded dataset can be written to a single Parquet file and loaded back
//! verbatim on later runs. The file is trusted: no coverage checks are made
//! when reading it.
//!
//! Writes go through a temp file and a rename, so readers always see a
//! complete file. The cache can also be queried directly, e.g. with DuckDB:
//!
//! ```sql
//! SELECT user_name, SUM(distance) FROM 'dataset.parquet' GROUP BY user_name;
//! ```

mod parquet;

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::Dataset;

/// Extension that marks a path as the dataset cache
pub const CACHE_EXTENSION: &str = "parquet";

/// Whether a path names a dataset cache file
pub fn is_cache_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(CACHE_EXTENSION))
        .unwrap_or(false)
}

/// Write a dataset to a cache file, replacing any previous one
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let batch = parquet::records_to_batch(dataset.records())?;
    parquet::write_batch(path, &batch)?;
    info!(path = %path.display(), records = dataset.len(), "wrote dataset cache");
    Ok(())
}

/// Read a dataset cache file as-is
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let mut records = Vec::new();
    for batch in parquet::read_batches(path)? {
        records.extend(parquet::batch_to_records(&batch)?);
    }
    Ok(Dataset::new(records))
}
