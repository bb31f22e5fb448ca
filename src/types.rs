//! Core data types shared by the loader, aggregator and writer

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ParseMoneyError;

/// Window size tag carried by every per-period record read from the input.
pub const RAW_INTERVAL: usize = 1;

/// Instrument identifier using Arc<str> for cheap cloning
///
/// Every record of a run carries the same identifier, so cloning it per row
/// must not allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ============================================================================
// Money Type - Decimal Arithmetic for Prices and Volumes
// ============================================================================

/// Numeric value of a price or quantity.
///
/// Uses `rust_decimal::Decimal` so window sums do not drift. Magnitudes
/// beyond Decimal's range (about 7.9e28) are carried as `f64` instead of
/// rejecting the row; any arithmetic or comparison involving one is done in
/// `f64`.
#[derive(Debug, Clone, Copy)]
pub enum Money {
    Exact(Decimal),
    Approx(f64),
}

impl Money {
    /// Zero value
    pub const ZERO: Money = Money::Exact(Decimal::ZERO);

    /// Convert to f64
    pub fn to_f64(self) -> f64 {
        match self {
            Money::Exact(d) => d.to_f64().unwrap_or_default(),
            Money::Approx(v) => v,
        }
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::Exact(value)
    }
}

/// Accepts plain decimals (`101.5`), scientific notation (`1.015e2`) and any
/// finite float text too large for a Decimal.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(d) = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
            return Ok(Money::Exact(d));
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Money::Approx(v)),
            _ => Err(ParseMoneyError(s.to_string())),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Money::Exact(d) => write!(f, "{}", d),
            Money::Approx(v) => write!(f, "{}", v),
        }
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Money::Exact(a), Money::Exact(b)) => Some(a.cmp(b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Money::Exact(a), Money::Exact(b)) => a
                .checked_add(b)
                .map(Money::Exact)
                .unwrap_or_else(|| Money::Approx(self.to_f64() + rhs.to_f64())),
            _ => Money::Approx(self.to_f64() + rhs.to_f64()),
        }
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

// ============================================================================
// Quote - Field Text Plus Its Numeric Value
// ============================================================================

/// A price or volume field as written in the input, with its parsed value.
///
/// Serializes as the original text, so raw rows pass through byte for byte
/// (`1.5e3`, `+2` and ` 10.50` are written back unchanged). Comparisons and
/// sums use [`Quote::value`].
///
/// # Example
/// ```
/// use interval_bars::{Money, Quote};
/// let q = Quote::parse("1.5e3").unwrap();
/// assert_eq!(q.as_str(), "1.5e3");
/// assert_eq!(q.value(), "1500".parse::<Money>().unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    text: Arc<str>,
    value: Money,
}

impl Quote {
    pub fn parse(text: &str) -> Result<Self, ParseMoneyError> {
        Ok(Quote {
            value: text.parse()?,
            text: Arc::from(text),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> Money {
        self.value
    }
}

/// Computed values are written in their canonical form.
impl From<Money> for Quote {
    fn from(value: Money) -> Self {
        Quote {
            text: Arc::from(value.to_string()),
            value,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Serialize for Quote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

// ============================================================================
// Interval Record
// ============================================================================

/// One output row: a raw per-period sample (`interval == 1`) or an aggregate
/// over `interval` consecutive samples.
///
/// Field order is the serialized column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalRecord {
    pub instrument_id: Symbol,
    pub close: Quote,
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    pub interval: usize,
    pub high: Quote,
    pub low: Quote,
    pub open: Quote,
    pub volume: Quote,
}

impl IntervalRecord {
    /// True for records read from the input rather than synthesized.
    pub fn is_raw(&self) -> bool {
        self.interval == RAW_INTERVAL
    }
}
