//! Row conversion for period file exports

use crate::error::{Result, StatsError};
use crate::models::{ActivityRecord, RunType, YearMonth};
use crate::parse;

/// Column order of the exports
pub const COLUMNS: [&str; 11] = [
    "end_time", "status", "id", "name", "gender", "distance", "time", "run_type", "pace",
    "cadence", "stride",
];

const END_TIME: usize = 0;
const STATUS: usize = 1;
const ID: usize = 2;
const NAME: usize = 3;
const GENDER: usize = 4;
const DISTANCE: usize = 5;
const TIME: usize = 6;
const RUN_TYPE: usize = 7;
const PACE: usize = 8;
const CADENCE: usize = 9;
const STRIDE: usize = 10;

/// Whether every cell of a row is blank
pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Convert one export row; `week_no` is left at zero until the calendar pass
pub fn parse_row(row: &[String]) -> Result<ActivityRecord> {
    if row.len() < COLUMNS.len() {
        return Err(StatsError::parse(format!(
            "expected {} columns ({}), found {}",
            COLUMNS.len(),
            COLUMNS.join(", "),
            row.len()
        )));
    }
    let cell = |i: usize| row[i].as_str();

    let end_time = parse::parse_timestamp(cell(END_TIME))?;
    let mut record = ActivityRecord {
        end_time,
        status: cell(STATUS).trim().to_string(),
        user_id: parse::parse_user_id(cell(ID))?,
        user_name: cell(NAME).trim().to_string(),
        gender: cell(GENDER).trim().to_string(),
        distance: parse::parse_float(cell(DISTANCE)),
        duration: parse::parse_duration(cell(TIME))?,
        run_type: RunType::from_label(cell(RUN_TYPE)),
        pace: parse::parse_pace(cell(PACE))?,
        cadence: parse::parse_int(cell(CADENCE)),
        stride_length: parse::parse_float(cell(STRIDE)),
        year: 0,
        month: YearMonth::of(end_time.date()),
        week_no: 0,
    };
    record.derive_calendar_fields();

    Ok(record)
}

/// Add file and row position to a conversion error
pub fn with_position(err: StatsError, file: &str, row: usize) -> StatsError {
    match err {
        StatsError::Parse(msg) => StatsError::parse(format!("{} row {}: {}", file, row, msg)),
        other => other,
    }
}
