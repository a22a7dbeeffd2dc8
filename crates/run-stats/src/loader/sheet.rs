//! Spreadsheet access for period files
//!
//! The loader only needs each file as rows of text cells; [`SheetReader`] is the
//! seam between the pipeline and whatever reads the files.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{Result, StatsError};
use crate::parse::TIMESTAMP_FORMAT;

/// Reads the first worksheet of a file as text cells
pub trait SheetReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<Vec<String>>>;
}

/// Excel reader backed by calamine
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxReader;

impl SheetReader for XlsxReader {
    fn read_rows(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| StatsError::sheet(format!("Failed to open {:?}: {}", path, e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| StatsError::sheet(format!("{:?} has no worksheets", path)))?
            .map_err(|e| StatsError::sheet(format!("Failed to read {:?}: {}", path, e)))?;

        Ok(range_rows(&range))
    }
}

/// Cell text with row `i`, column `j` at sheet cell `(i, j)`
///
/// calamine trims leading blank rows and columns from the used range, so they
/// are restored here.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let width = start_col as usize + range.width();

    let mut rows = vec![vec![String::new(); width]; start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}
