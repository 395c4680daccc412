// crates/pci-gate-core/src/core/time.rs
// ============================================================================
// Module: PCI Gate Time Helpers
// Description: RFC 3339 parsing/formatting and calendar arithmetic.
// Purpose: Keep timestamp handling explicit and caller-supplied.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Operations that depend on "now" accept it as an argument and only fall back
//! to the wall clock at the outermost call. Timestamps cross the API boundary
//! as RFC 3339 strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serializer;
use time::Date;
use time::Month;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::PciError;

// ============================================================================
// SECTION: Parsing and Formatting
// ============================================================================

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`PciError::InvalidTimestamp`] when the input does not parse.
pub fn parse_rfc3339(value: &str) -> Result<OffsetDateTime, PciError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339)
        .map_err(|err| PciError::InvalidTimestamp(err.to_string()))
}

/// Formats a timestamp as RFC 3339, falling back to the unix timestamp on failure.
#[must_use]
pub fn format_rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
}

/// Serde helper that writes an [`OffsetDateTime`] as RFC 3339.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_rfc3339<S: Serializer>(
    value: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_rfc3339(*value))
}

/// Serde helper that writes an optional [`OffsetDateTime`] as RFC 3339.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_rfc3339_opt<S: Serializer>(
    value: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format_rfc3339(*value)),
        None => serializer.serialize_none(),
    }
}

/// Serde helper that reads an optional RFC 3339 timestamp.
///
/// # Errors
///
/// Returns a deserializer error when the value is present but does not parse.
pub fn deserialize_rfc3339_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| parse_rfc3339(&value).map_err(serde::de::Error::custom)).transpose()
}

/// Returns milliseconds since the unix epoch, clamped to zero for pre-epoch values.
#[must_use]
pub fn unix_millis(value: OffsetDateTime) -> u128 {
    u128::try_from(value.unix_timestamp_nanos() / 1_000_000).unwrap_or_default()
}

// ============================================================================
// SECTION: Calendar Arithmetic
// ============================================================================

/// Adds calendar months, clamping the day to the end of the target month.
///
/// Time of day and offset are preserved. Returns `None` when the result falls
/// outside the supported date range.
#[must_use]
pub fn add_calendar_months(value: OffsetDateTime, months: u32) -> Option<OffsetDateTime> {
    let date = value.date();
    let zero_based = i64::from(date.month() as u8) - 1 + i64::from(months);
    let year = i64::from(date.year()) + zero_based.div_euclid(12);
    let year = i32::try_from(year).ok()?;
    let month_index = u8::try_from(zero_based.rem_euclid(12) + 1).ok()?;
    let month = Month::try_from(month_index).ok()?;
    let mut day = date.day();
    loop {
        if let Ok(target) = Date::from_calendar_date(year, month, day) {
            return Some(value.replace_date(target));
        }
        if day <= 28 {
            return None;
        }
        day -= 1;
    }
}
