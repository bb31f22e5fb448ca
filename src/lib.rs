//! Interval Bars
//!
//! Converts a per-minute OHLCV CSV for one instrument into a combined CSV of
//! the original bars plus synthesized 5, 15, 30 and 60 bar aggregates, in the
//! fixed record layout expected by the downstream price-history loader.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod timestamp;
pub mod types;

pub use config::Config;
pub use error::RowError;
pub use pipeline::RunSummary;
pub use types::*;
