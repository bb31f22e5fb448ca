//! Data loading and writing
//!
//! Reads raw bar CSVs into [`IntervalRecord`]s and serializes record
//! sequences back out as headerless (by default) CSV.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::StringRecord;
use itertools::Itertools;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, InvalidNumberPolicy};
use crate::error::RowError;
use crate::timestamp::synthesize_timestamp;
use crate::types::{IntervalRecord, Quote, Symbol, RAW_INTERVAL};

// =============================================================================
// Constants
// =============================================================================

/// Input columns: Date, Open, High, Low, Close, AdjClose, Volume
pub const RAW_FIELD_COUNT: usize = 7;

const OPEN_COLUMN: usize = 1;
const HIGH_COLUMN: usize = 2;
const LOW_COLUMN: usize = 3;
const CLOSE_COLUMN: usize = 4;
const VOLUME_COLUMN: usize = 6;

/// Column names written when a header is requested.
pub const OUTPUT_HEADER: [&str; 8] = [
    "stockId",
    "close",
    "createdAt",
    "intervalRecord",
    "high",
    "low",
    "open",
    "volume",
];

// =============================================================================
// CSV Loading
// =============================================================================

/// Outcome of reading one input file
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Header row as read; not validated.
    pub header: Vec<String>,
    /// Surviving rows in file order, all tagged as raw records.
    pub records: Vec<IntervalRecord>,
    /// Data rows seen, excluding the header.
    pub rows_read: usize,
    /// Rows dropped for containing the missing-value marker.
    pub dropped_missing: usize,
    /// Rows dropped for being too short or non-numeric.
    pub dropped_invalid: usize,
}

/// Load raw bars from a CSV file
pub fn load_records(
    path: impl AsRef<Path>,
    instrument: &Symbol,
    base: DateTime<Utc>,
    config: &Config,
) -> Result<LoadReport> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open input CSV {}", path.display()))?;

    let report = read_records(file, instrument, base, config)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    info!(
        "Loaded {} of {} rows from {}",
        report.records.len(),
        report.rows_read,
        path.display()
    );
    Ok(report)
}

/// Read raw bars from any CSV source.
///
/// The first row is always treated as a header. Each later row is stamped
/// with its 1-based data-row ordinal in minutes; the ordinal advances for
/// dropped rows too.
pub fn read_records<R: Read>(
    source: R,
    instrument: &Symbol,
    base: DateTime<Utc>,
    config: &Config,
) -> Result<LoadReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let header: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(String::from)
        .collect();
    info!("Input header: {}", header.iter().join(","));

    let mut report = LoadReport {
        header,
        ..Default::default()
    };

    for (row_idx, result) in reader.records().enumerate() {
        let position = row_idx + 1;
        let line = position + 1;
        let record = result.with_context(|| format!("Failed to read line {}", line))?;
        report.rows_read += 1;

        if record.iter().any(|field| field == config.missing_marker) {
            debug!("Dropping line {}: contains {:?}", line, config.missing_marker);
            report.dropped_missing += 1;
            continue;
        }

        let created_at = synthesize_timestamp(base, position as i64, config.utc_shift_hours);
        match parse_row(&record, line, instrument, created_at) {
            Ok(parsed) => report.records.push(parsed),
            Err(err) => match config.invalid_numbers {
                InvalidNumberPolicy::Skip => {
                    warn!("Dropping row: {}", err);
                    report.dropped_invalid += 1;
                }
                InvalidNumberPolicy::Fail => return Err(err.into()),
            },
        }
    }

    Ok(report)
}

/// Reshape one input row into a raw record
fn parse_row(
    record: &StringRecord,
    line: usize,
    instrument: &Symbol,
    created_at: DateTime<Utc>,
) -> Result<IntervalRecord, RowError> {
    if record.len() < RAW_FIELD_COUNT {
        return Err(RowError::MissingField {
            line,
            expected: RAW_FIELD_COUNT,
            found: record.len(),
        });
    }

    Ok(IntervalRecord {
        instrument_id: instrument.clone(),
        close: parse_field(record, CLOSE_COLUMN, "close", line)?,
        created_at,
        interval: RAW_INTERVAL,
        high: parse_field(record, HIGH_COLUMN, "high", line)?,
        low: parse_field(record, LOW_COLUMN, "low", line)?,
        open: parse_field(record, OPEN_COLUMN, "open", line)?,
        volume: parse_field(record, VOLUME_COLUMN, "volume", line)?,
    })
}

fn parse_field(
    record: &StringRecord,
    column: usize,
    field: &'static str,
    line: usize,
) -> Result<Quote, RowError> {
    let text = record.get(column).unwrap_or_default();
    Quote::parse(text).map_err(|_| RowError::InvalidNumber {
        line,
        field,
        value: text.to_string(),
    })
}

// =============================================================================
// CSV Writing
// =============================================================================

/// Write records to a CSV file, replacing any existing file
pub fn write_records(
    path: impl AsRef<Path>,
    records: &[IntervalRecord],
    write_header: bool,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    write_to(file, records, write_header)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Serialize records to any sink, one per line, in [`OUTPUT_HEADER`] order
pub fn write_to<W: Write>(sink: W, records: &[IntervalRecord], write_header: bool) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);

    if write_header {
        writer.write_record(OUTPUT_HEADER)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
