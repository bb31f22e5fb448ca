//! Synthesized record timestamps
//!
//! Input rows carry no usable time of day, so each record is stamped with an
//! instant derived from a single base instant captured at startup plus the
//! row's ordinal in minutes.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serializer;

/// Hours subtracted from the base hour before the row offset is applied.
pub const DEFAULT_UTC_SHIFT_HOURS: i64 = 4;

/// Output format; seconds are always zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Derive the instant for a row `offset_minutes` after the shifted base hour.
///
/// The base is truncated to the start of its hour, moved back by
/// `shift_hours`, then advanced by `offset_minutes`. Minute, hour, day, month
/// and year overflow are all carried by calendar arithmetic.
pub fn synthesize_timestamp(
    base: DateTime<Utc>,
    offset_minutes: i64,
    shift_hours: i64,
) -> DateTime<Utc> {
    let into_hour = Duration::minutes(i64::from(base.minute()))
        + Duration::seconds(i64::from(base.second()))
        + Duration::nanoseconds(i64::from(base.nanosecond()));

    base - into_hour - Duration::hours(shift_hours) + Duration::minutes(offset_minutes)
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter writing [`TIMESTAMP_FORMAT`] text.
pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&instant.format(TIMESTAMP_FORMAT))
}
