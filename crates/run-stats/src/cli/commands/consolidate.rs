//! Consolidate command for run-stats

use std::path::PathBuf;

use crate::config::{default_cache_path, LoadOptions};
use crate::error::Result;
use crate::loader::DatasetLoader;
use crate::storage;

/// Load every period file in a directory and write the dataset cache
pub fn run(dir: PathBuf, output: Option<PathBuf>, debug: bool) -> Result<()> {
    let loader = DatasetLoader::new(LoadOptions::default().debug(debug));
    let (dataset, report) = loader.load_with_report(&dir)?;

    let output = match output {
        Some(path) => path,
        None => default_cache_path()?,
    };
    storage::write_dataset(&output, &dataset)?;

    println!("Dataset: {}", output.display());
    println!();
    println!("  Files:     {:>8}", report.files.len());
    println!("  Records:   {:>8}", dataset.len());
    println!("  Warnings:  {:>8}", report.warnings.len());
    if let Some((start, end)) = dataset.date_range() {
        println!("  Range:     {} ~ {}", start, end);
    }

    if !report.is_clean() {
        println!("\nRun 'run-stats check {}' for details.", dir.display());
    }

    Ok(())
}
