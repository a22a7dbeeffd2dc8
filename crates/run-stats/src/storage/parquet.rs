//! Parquet read/write for the consolidated dataset
//!
//! One Arrow record batch holds the whole dataset, one column per record field.
//! Spans are stored as whole seconds, `end_time` as a naive microsecond timestamp.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{Result, StatsError};
use crate::models::{ActivityRecord, RunType, YearMonth};

/// Write a record batch to a file atomically
pub(crate) fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    // Write to temp file first
    let temp_path = path.with_extension("parquet.tmp");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                StatsError::cache(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }
    }

    let file = File::create(&temp_path)
        .map_err(|e| StatsError::cache(format!("Failed to create temp file: {}", e)))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| StatsError::cache(format!("Failed to create Parquet writer: {}", e)))?;

    writer
        .write(batch)
        .map_err(|e| StatsError::cache(format!("Failed to write batch: {}", e)))?;

    writer
        .close()
        .map_err(|e| StatsError::cache(format!("Failed to close writer: {}", e)))?;

    // Atomic rename
    fs::rename(&temp_path, path)
        .map_err(|e| StatsError::cache(format!("Failed to rename temp file: {}", e)))?;

    Ok(())
}

/// Read all record batches from a file
pub(crate) fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)
        .map_err(|e| StatsError::cache(format!("Failed to open {:?}: {}", path, e)))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| StatsError::cache(format!("Failed to create reader: {}", e)))?
        .build()
        .map_err(|e| StatsError::cache(format!("Failed to build reader: {}", e)))?;

    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StatsError::cache(format!("Failed to read batches: {}", e)))
}

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("end_time", DataType::Timestamp(TimeUnit::Microsecond, None), false),
        Field::new("status", DataType::Utf8, false),
        Field::new("user_id", DataType::Int64, false),
        Field::new("user_name", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("distance", DataType::Float64, false),
        Field::new("duration_sec", DataType::Int64, false),
        Field::new("run_type", DataType::Utf8, false),
        Field::new("pace_sec", DataType::Int64, false),
        Field::new("cadence", DataType::Int64, false),
        Field::new("stride_length", DataType::Float64, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("week_no", DataType::UInt32, false),
    ])
}

pub(crate) fn records_to_batch(records: &[ActivityRecord]) -> Result<RecordBatch> {
    let end_time = TimestampMicrosecondArray::from(
        records
            .iter()
            .map(|r| r.end_time.and_utc().timestamp_micros())
            .collect::<Vec<_>>(),
    );
    let status = StringArray::from(records.iter().map(|r| r.status.as_str()).collect::<Vec<_>>());
    let user_id = Int64Array::from(records.iter().map(|r| r.user_id).collect::<Vec<_>>());
    let user_name =
        StringArray::from(records.iter().map(|r| r.user_name.as_str()).collect::<Vec<_>>());
    let gender = StringArray::from(records.iter().map(|r| r.gender.as_str()).collect::<Vec<_>>());
    let distance = Float64Array::from(records.iter().map(|r| r.distance).collect::<Vec<_>>());
    let duration_sec = Int64Array::from(
        records
            .iter()
            .map(|r| r.duration.num_seconds())
            .collect::<Vec<_>>(),
    );
    let run_type =
        StringArray::from(records.iter().map(|r| r.run_type.label()).collect::<Vec<_>>());
    let pace_sec =
        Int64Array::from(records.iter().map(|r| r.pace.num_seconds()).collect::<Vec<_>>());
    let cadence = Int64Array::from(records.iter().map(|r| r.cadence).collect::<Vec<_>>());
    let stride_length =
        Float64Array::from(records.iter().map(|r| r.stride_length).collect::<Vec<_>>());
    let year = Int32Array::from(records.iter().map(|r| r.year).collect::<Vec<_>>());
    let month = StringArray::from(
        records
            .iter()
            .map(|r| r.month.to_string())
            .collect::<Vec<_>>(),
    );
    let week_no = UInt32Array::from(records.iter().map(|r| r.week_no).collect::<Vec<_>>());

    RecordBatch::try_new(
        Arc::new(schema()),
        vec![
            Arc::new(end_time),
            Arc::new(status),
            Arc::new(user_id),
            Arc::new(user_name),
            Arc::new(gender),
            Arc::new(distance),
            Arc::new(duration_sec),
            Arc::new(run_type),
            Arc::new(pace_sec),
            Arc::new(cadence),
            Arc::new(stride_length),
            Arc::new(year),
            Arc::new(month),
            Arc::new(week_no),
        ],
    )
    .map_err(|e| StatsError::cache(format!("Failed to create record batch: {}", e)))
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StatsError::cache(format!("Missing or mistyped column '{}'", name)))
}

pub(crate) fn batch_to_records(batch: &RecordBatch) -> Result<Vec<ActivityRecord>> {
    let len = batch.num_rows();
    let mut records = Vec::with_capacity(len);

    let end_time = column::<TimestampMicrosecondArray>(batch, "end_time")?;
    let status = column::<StringArray>(batch, "status")?;
    let user_id = column::<Int64Array>(batch, "user_id")?;
    let user_name = column::<StringArray>(batch, "user_name")?;
    let gender = column::<StringArray>(batch, "gender")?;
    let distance = column::<Float64Array>(batch, "distance")?;
    let duration_sec = column::<Int64Array>(batch, "duration_sec")?;
    let run_type = column::<StringArray>(batch, "run_type")?;
    let pace_sec = column::<Int64Array>(batch, "pace_sec")?;
    let cadence = column::<Int64Array>(batch, "cadence")?;
    let stride_length = column::<Float64Array>(batch, "stride_length")?;
    let year = column::<Int32Array>(batch, "year")?;
    let month = column::<StringArray>(batch, "month")?;
    let week_no = column::<UInt32Array>(batch, "week_no")?;

    for i in 0..len {
        let end = DateTime::from_timestamp_micros(end_time.value(i))
            .ok_or_else(|| StatsError::cache(format!("Invalid end_time at row {}", i)))?
            .naive_utc();

        records.push(ActivityRecord {
            end_time: end,
            status: status.value(i).to_string(),
            user_id: user_id.value(i),
            user_name: user_name.value(i).to_string(),
            gender: gender.value(i).to_string(),
            distance: distance.value(i),
            duration: Duration::seconds(duration_sec.value(i)),
            run_type: RunType::from_label(run_type.value(i)),
            pace: Duration::seconds(pace_sec.value(i)),
            cadence: cadence.value(i),
            stride_length: stride_length.value(i),
            year: year.value(i),
            month: month.value(i).parse::<YearMonth>()?,
            week_no: week_no.value(i),
        });
    }

    Ok(records)
}
