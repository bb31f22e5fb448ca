//! Loader → aggregator → writer composition

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregate::{aggregate_all, interleave};
use crate::config::Config;
use crate::data::{self, LoadReport};
use crate::types::{IntervalRecord, Symbol};

/// Counts describing one conversion run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub rows_read: usize,
    pub records_kept: usize,
    pub dropped_missing: usize,
    pub dropped_invalid: usize,
    /// `(window, aggregates produced)` in emission order.
    pub aggregates: Vec<(usize, usize)>,
    pub rows_written: usize,
}

/// Output path derived from the input file name: `<prefix><file name>`,
/// relative to the working directory.
pub fn default_output_path(input: &Path, prefix: &str) -> Result<PathBuf> {
    let Some(file_name) = input.file_name() else {
        bail!("Input path {} has no file name", input.display());
    };
    Ok(PathBuf::from(format!("{}{}", prefix, file_name.to_string_lossy())))
}

/// Raw records followed, at each window boundary, by the aggregates it closes.
pub fn build_output(raw: &[IntervalRecord], config: &Config) -> (Vec<(usize, usize)>, Vec<IntervalRecord>) {
    let aggregates = aggregate_all(raw, &config.windows, config.window_span);
    let counts = aggregates
        .iter()
        .map(|set| (set.window, set.records.len()))
        .collect();
    (counts, interleave(raw, &aggregates))
}

/// Convert one input file into the combined output file.
pub fn convert_file(
    input: &Path,
    output: &Path,
    instrument: &Symbol,
    base: DateTime<Utc>,
    config: &Config,
) -> Result<RunSummary> {
    config.validate()?;

    let LoadReport {
        records,
        rows_read,
        dropped_missing,
        dropped_invalid,
        ..
    } = data::load_records(input, instrument, base, config)?;

    let (aggregates, combined) = build_output(&records, config);
    for (window, count) in &aggregates {
        info!("Window {}: {} aggregate rows", window, count);
    }

    data::write_records(output, &combined, config.write_header)?;

    Ok(RunSummary {
        output_path: output.to_path_buf(),
        rows_read,
        records_kept: records.len(),
        dropped_missing,
        dropped_invalid,
        aggregates,
        rows_written: combined.len(),
    })
}
