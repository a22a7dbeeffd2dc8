//! Dataset loading
//!
//! Period files are read in file name order. File names embed the date window,
//! so name order is chronological order, and rows inside each file are already
//! ordered by `end_time`. Concatenating the files therefore yields a dataset
//! ordered by `end_time` without sorting; the loader only checks it.
//!
//! ```text
//! data/
//! ├── club_20230101-0131.xlsx
//! ├── club_20230201-0228.xlsx
//! └── ...
//! ```
//!
//! A `.parquet` path is taken to be a dataset previously written by
//! [`crate::storage::write_dataset`] and is returned without validation.

mod coverage;
mod rows;
mod sheet;

pub use coverage::{CoverageTracker, FileCoverage, LoadReport, PeriodWindow, ValidationWarning};
pub use rows::{parse_row, COLUMNS};
pub use sheet::{SheetReader, XlsxReader};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::calendar::CalendarTable;
use crate::config::LoadOptions;
use crate::error::{Result, StatsError};
use crate::models::{ActivityRecord, Dataset};
use crate::storage;

/// Loads period files (or the dataset cache) into a [`Dataset`]
pub struct DatasetLoader<R = XlsxReader> {
    reader: R,
    options: LoadOptions,
}

impl DatasetLoader<XlsxReader> {
    pub fn new(options: LoadOptions) -> Self {
        Self::with_reader(XlsxReader, options)
    }
}

impl<R: SheetReader> DatasetLoader<R> {
    pub fn with_reader(reader: R, options: LoadOptions) -> Self {
        Self { reader, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a directory of period files, a single period file, or the cache
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        self.load_with_report(path).map(|(dataset, _)| dataset)
    }

    /// Like [`load`](Self::load), also returning per-file coverage and warnings
    pub fn load_with_report(&self, path: &Path) -> Result<(Dataset, LoadReport)> {
        if storage::is_cache_file(path) {
            info!(path = %path.display(), "loading consolidated dataset");
            let dataset = storage::read_dataset(path)?;
            return Ok((dataset, LoadReport::default()));
        }

        let files = if path.is_dir() {
            self.period_files(path)?
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(StatsError::EmptyDataset(path.display().to_string()));
        }

        self.load_files(&files)
    }

    /// Period files in a directory, sorted by file name
    pub fn period_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let accepted = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.options.accepts_extension(e))
                .unwrap_or(false);
            if path.is_file() && accepted {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Load an explicit list of period files, already in merge order
    pub fn load_files(&self, files: &[PathBuf]) -> Result<(Dataset, LoadReport)> {
        let files = if self.options.debug && files.len() > 1 {
            &files[..1]
        } else {
            files
        };

        let mut report = LoadReport::default();
        let mut tracker = CoverageTracker::default();
        let mut records: Vec<ActivityRecord> = Vec::new();

        for (seq, path) in files.iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let file_records = self.read_file(path, &name)?;
            let previous_end = records.last().map(|r| r.end_time);
            let coverage = check_file(&name, &file_records, previous_end, &mut tracker, &mut report);

            info!(
                seq = seq + 1,
                file = %name,
                rows = coverage.rows,
                valid = coverage.valid,
                "loaded period file"
            );

            report.files.push(coverage);
            records.extend(file_records);
        }

        for month in tracker.missing_months() {
            report.warnings.push(ValidationWarning::MissingMonth { month });
        }

        if records.is_empty() {
            return Err(StatsError::EmptyDataset(
                files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }

        // Only reachable when a file breaks the ordering assumption; reported above
        records.sort_by_key(|r| r.end_time);

        derive_fields(&mut records, self.options.calendar_horizon_years)?;

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        info!(
            files = files.len(),
            records = records.len(),
            warnings = report.warnings.len(),
            "dataset loaded"
        );

        Ok((Dataset::new(records), report))
    }

    fn read_file(&self, path: &Path, name: &str) -> Result<Vec<ActivityRecord>> {
        let rows = self.reader.read_rows(path)?;

        rows.iter()
            .enumerate()
            .skip(self.options.header_rows)
            .filter(|(_, row)| !rows::is_blank(row))
            .map(|(i, row)| parse_row(row).map_err(|e| rows::with_position(e, name, i + 1)))
            .collect()
    }
}

/// Validate one file's rows against its name and record the outcome
fn check_file(
    name: &str,
    records: &[ActivityRecord],
    previous_end: Option<chrono::NaiveDateTime>,
    tracker: &mut CoverageTracker,
    report: &mut LoadReport,
) -> FileCoverage {
    let window = PeriodWindow::from_file_name(name);
    let first = records.iter().map(|r| r.end_time).min();
    let last = records.iter().map(|r| r.end_time).max();

    let ordered = records.windows(2).all(|w| w[0].end_time <= w[1].end_time)
        && match (previous_end, records.first()) {
            (Some(prev), Some(head)) => prev <= head.end_time,
            _ => true,
        };
    if !ordered {
        report.warnings.push(ValidationWarning::OutOfOrder {
            file: name.to_string(),
        });
    }

    let valid = match (window, first, last) {
        (Some(window), Some(first), Some(last)) => {
            let valid = window.matches(first.date(), last.date());
            if !valid {
                report.warnings.push(ValidationWarning::RangeMismatch {
                    file: name.to_string(),
                    expected: window,
                    first,
                    last,
                });
            }
            tracker.record(&window, valid);
            valid
        }
        (Some(window), _, _) => {
            report.warnings.push(ValidationWarning::EmptyFile {
                file: name.to_string(),
            });
            tracker.record(&window, false);
            false
        }
        (None, _, _) => {
            report.warnings.push(ValidationWarning::UnrecognizedFileName {
                file: name.to_string(),
            });
            false
        }
    };

    FileCoverage {
        file: name.to_string(),
        window,
        first,
        last,
        rows: records.len(),
        valid,
    }
}

/// Fill `year`, `month` and `week_no` on chronologically ordered records
pub fn derive_fields(records: &mut [ActivityRecord], horizon_years: u32) -> Result<()> {
    let Some(anchor) = records.first().map(|r| r.date()) else {
        return Ok(());
    };

    let calendar = CalendarTable::build(anchor, horizon_years);
    for record in records.iter_mut() {
        record.derive_calendar_fields();
        record.week_no = calendar.week_of(record.date())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemoryReader(HashMap<PathBuf, Vec<Vec<String>>>);

    impl SheetReader for MemoryReader {
        fn read_rows(&self, path: &Path) -> Result<Vec<Vec<String>>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| StatsError::sheet(format!("missing {:?}", path)))
        }
    }

    fn sheet(end_times: &[&str]) -> Vec<Vec<String>> {
        let mut rows = vec![vec!["banner".to_string()]; 2];
        rows.push(COLUMNS.iter().map(|c| c.to_string()).collect());
        for end_time in end_times {
            rows.push(
                [
                    end_time,
                    "normal",
                    "7",
                    "Ann",
                    "F",
                    "5.0",
                    "30:00",
                    "室外跑步",
                    "6'00\"",
                    "170",
                    "1.0",
                ]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            );
        }
        rows
    }

    fn loader(files: Vec<(&str, Vec<Vec<String>>)>) -> DatasetLoader<MemoryReader> {
        let sheets = files
            .into_iter()
            .map(|(name, rows)| (PathBuf::from(name), rows))
            .collect();
        DatasetLoader::with_reader(MemoryReader(sheets), LoadOptions::default().header_rows(3))
    }

    #[test]
    fn test_header_rows_are_skipped() {
        let loader = loader(vec![(
            "c_20230101-0131.xlsx",
            sheet(&["2023-01-01 08:00:00", "2023-01-31 08:00:00"]),
        )]);
        let (dataset, report) = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(report.files[0].valid);
    }

    #[test]
    fn test_debug_loads_first_file_only() {
        let names = ["c_20230101-0131.xlsx", "c_20230201-0228.xlsx"];
        let loader = DatasetLoader::with_reader(
            MemoryReader(
                [
                    (PathBuf::from(names[0]), sheet(&["2023-01-01 08:00:00"])),
                    (PathBuf::from(names[1]), sheet(&["2023-02-01 08:00:00"])),
                ]
                .into_iter()
                .collect(),
            ),
            LoadOptions::default().header_rows(3).debug(true),
        );
        let files: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let (dataset, report) = loader.load_files(&files).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_out_of_order_file_is_reported_and_sorted() {
        let loader = loader(vec![(
            "c_20230101-0131.xlsx",
            sheet(&["2023-01-31 08:00:00", "2023-01-01 08:00:00"]),
        )]);
        let (dataset, report) = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap();
        assert!(dataset.is_chronological());
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, ValidationWarning::OutOfOrder { .. })));
        // Window still matches: min and max are what is compared
        assert!(report.files[0].valid);
    }

    #[test]
    fn test_unrecognized_file_name_still_loads() {
        let loader = loader(vec![("members.xlsx", sheet(&["2023-01-05 08:00:00"]))]);
        let (dataset, report) = loader.load_files(&[PathBuf::from("members.xlsx")]).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::UnrecognizedFileName {
                file: "members.xlsx".to_string()
            }]
        );
    }

    #[test]
    fn test_no_rows_is_empty_dataset() {
        let loader = loader(vec![("c_20230101-0131.xlsx", sheet(&[]))]);
        let err = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap_err();
        assert!(matches!(err, StatsError::EmptyDataset(_)));
    }

    #[test]
    fn test_parse_error_names_file_and_row() {
        let loader = loader(vec![("c_20230101-0131.xlsx", sheet(&["2023-01-01"]))]);
        let err = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap_err();
        assert!(err.to_string().contains("c_20230101-0131.xlsx row 4"));
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let loader = loader(vec![]);
        let err = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap_err();
        assert!(matches!(err, StatsError::Sheet(_)));
    }

    #[test]
    fn test_week_numbers_assigned() {
        // 2023-01-01 is a Sunday, so the 2nd starts week 2
        let loader = loader(vec![(
            "c_20230101-0131.xlsx",
            sheet(&[
                "2023-01-01 08:00:00",
                "2023-01-02 08:00:00",
                "2023-01-08 08:00:00",
                "2023-01-09 08:00:00",
                "2023-01-31 08:00:00",
            ]),
        )]);
        let (dataset, _) = loader
            .load_files(&[PathBuf::from("c_20230101-0131.xlsx")])
            .unwrap();
        let weeks: Vec<u32> = dataset.iter().map(|r| r.week_no).collect();
        assert_eq!(weeks, vec![1, 2, 2, 3, 6]);
    }
}
