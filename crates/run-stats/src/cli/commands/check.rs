//! Coverage check command for run-stats

use std::path::PathBuf;

use crate::config::LoadOptions;
use crate::error::Result;
use crate::loader::{DatasetLoader, FileCoverage, LoadReport};

/// Load a directory of period files and print what each one covers
pub fn run(dir: PathBuf, debug: bool) -> Result<()> {
    let loader = DatasetLoader::new(LoadOptions::default().debug(debug));
    let (dataset, report) = loader.load_with_report(&dir)?;

    for line in coverage_lines(&report) {
        println!("{}", line);
    }
    println!("\n{} records loaded", dataset.len());

    if report.is_clean() {
        println!("All files match their date windows.");
        return Ok(());
    }

    println!("\nWarnings:");
    for warning in &report.warnings {
        println!("  {}", warning);
    }

    Ok(())
}

fn coverage_lines(report: &LoadReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{:<32} {:<16} {:<20} {:<20} {:>6} {:>6}",
            "File", "Window", "First", "Last", "Rows", "Valid"
        ),
        "-".repeat(105),
    ];
    lines.extend(report.files.iter().map(coverage_line));
    lines
}

fn coverage_line(file: &FileCoverage) -> String {
    let dash = || "-".to_string();
    format!(
        "{:<32} {:<16} {:<20} {:<20} {:>6} {:>6}",
        file.file,
        file.window.map(|w| w.to_string()).unwrap_or_else(dash),
        file.first.map(|t| t.to_string()).unwrap_or_else(dash),
        file.last.map(|t| t.to_string()).unwrap_or_else(dash),
        file.rows,
        if file.valid { "yes" } else { "no" }
    )
}
