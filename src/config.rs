//! Configuration management
//!
//! Every setting has a default matching the loader's historical behavior, so a
//! config file is optional. Values from a JSON file can be overridden by CLI
//! flags before [`Config::validate`] runs.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::timestamp::DEFAULT_UTC_SHIFT_HOURS;

/// Default aggregate window sizes, in emission order.
pub const DEFAULT_WINDOWS: &[usize] = &[5, 15, 30, 60];

/// Default marker for a missing value in the input.
pub const DEFAULT_MISSING_MARKER: &str = "null";

/// Default prefix of the derived output file name.
pub const DEFAULT_OUTPUT_PREFIX: &str = "Result_";

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one aggregate window is required")]
    NoWindows,

    #[error("window size {0} is too small; aggregate windows must span at least 2 records")]
    WindowTooSmall(usize),

    #[error("window size {0} is listed more than once")]
    DuplicateWindow(usize),

    #[error("missing-value marker must not be empty")]
    EmptyMarker,
}

/// Which records of a window feed its high, low and volume.
///
/// Open always comes from the window's first record, close and timestamp
/// from its last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSpan {
    /// Scan every record except the window's first one. This reproduces the
    /// aggregates the price-history loader has always received.
    #[default]
    ExcludeOpen,
    /// Scan every record except the window's last one.
    ExcludeClose,
    /// Scan the whole window.
    Full,
}

/// What to do with a row whose price or volume fields do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidNumberPolicy {
    /// Drop the row and log a warning.
    #[default]
    Skip,
    /// Abort the run.
    Fail,
}

/// Source of the base instant for synthesized timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clock {
    /// Local wall-clock time, read as if it were UTC.
    #[default]
    Local,
    Utc,
}

impl Clock {
    /// Capture the base instant. Called once per run.
    pub fn now(self) -> DateTime<Utc> {
        match self {
            Clock::Local => {
                DateTime::<Utc>::from_naive_utc_and_offset(Local::now().naive_local(), Utc)
            }
            Clock::Utc => Utc::now(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregate window sizes; aggregates at the same position are emitted
    /// in this order.
    pub windows: Vec<usize>,
    /// A row containing this exact text in any field is dropped.
    pub missing_marker: String,
    /// Hours subtracted from the base hour when synthesizing timestamps.
    pub utc_shift_hours: i64,
    pub window_span: WindowSpan,
    pub invalid_numbers: InvalidNumberPolicy,
    /// Write a column header as the first output line.
    pub write_header: bool,
    /// Prefix joined to the input file name to form the default output path.
    pub output_prefix: String,
    pub clock: Clock,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            windows: DEFAULT_WINDOWS.to_vec(),
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
            utc_shift_hours: DEFAULT_UTC_SHIFT_HOURS,
            window_span: WindowSpan::default(),
            invalid_numbers: InvalidNumberPolicy::default(),
            write_header: false,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            clock: Clock::default(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Check the settings the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::NoWindows);
        }

        let mut seen = HashSet::new();
        for &window in &self.windows {
            if window < 2 {
                return Err(ConfigError::WindowTooSmall(window));
            }
            if !seen.insert(window) {
                return Err(ConfigError::DuplicateWindow(window));
            }
        }

        if self.missing_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }

        Ok(())
    }
}
