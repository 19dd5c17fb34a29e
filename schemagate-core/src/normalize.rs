//! Conversion of driver-native types and values into stable, JSON-safe forms.
//!
//! The database adapter decodes raw column values into the narrowest Rust
//! type it can; everything here is pure and maps those decoded values onto
//! [`SqlValue`]. Dates and timestamps become ISO-8601 text, `TIME` intervals
//! become signed seconds, decimals become floats, binary data is decoded as UTF-8 (or rendered as a UUID when it is
//! a 16-byte non-text value), and anything else falls back to text.

use crate::models::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Normalizes a column type as reported by the database.
///
/// The result is lowercase with runs of whitespace collapsed, so
/// `"INT(10)  UNSIGNED"` becomes `"int(10) unsigned"`.
pub fn normalize_type(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves a tri-state autoincrement signal into a boolean.
///
/// MySQL reports autoincrement through the `EXTRA` column; anything other
/// than an explicit `auto_increment` marker, including a missing value,
/// resolves to `false`.
pub fn autoincrement_flag(extra: Option<&str>) -> bool {
    extra.is_some_and(|e| e.to_ascii_lowercase().contains("auto_increment"))
}

/// Normalizes a column default.
///
/// A missing default and the literal `NULL` reported by MariaDB both mean
/// "no default".
pub fn normalize_default(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.eq_ignore_ascii_case("null"))
}

/// Unsigned integers that do not fit in `i64` become text.
pub fn from_u64(value: u64) -> SqlValue {
    i64::try_from(value).map_or_else(|_| SqlValue::Text(value.to_string()), SqlValue::Integer)
}

/// Non-finite floats have no JSON representation and become text.
pub fn from_f64(value: f64) -> SqlValue {
    if value.is_finite() {
        SqlValue::Float(value)
    } else {
        SqlValue::Text(value.to_string())
    }
}

/// Decimals arrive as text from the wire and become floats when parseable.
pub fn from_decimal_text(text: &str) -> SqlValue {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => SqlValue::Float(value),
        _ => SqlValue::Text(text.to_string()),
    }
}

/// Best-effort decoding of binary values.
///
/// Valid UTF-8 is kept as text. A 16-byte value that is not UTF-8 is treated
/// as a binary UUID. Anything else is decoded lossily.
pub fn from_bytes(bytes: &[u8]) -> SqlValue {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return SqlValue::Text(text.to_string());
    }
    if let Ok(uuid) = uuid::Uuid::from_slice(bytes) {
        return SqlValue::Text(uuid.hyphenated().to_string());
    }
    SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
}

/// Dates become `YYYY-MM-DD`.
pub fn from_date(value: NaiveDate) -> SqlValue {
    SqlValue::Text(value.format("%Y-%m-%d").to_string())
}

/// A `TIME` interval as signed total seconds.
///
/// `TIME` spans `-838:59:59` to `838:59:59`, so it is an interval rather
/// than a time of day.
pub fn from_interval(negative: bool, hours: u32, minutes: u8, seconds: u8, microseconds: u32) -> SqlValue {
    let magnitude = f64::from(hours) * 3600.0
        + f64::from(minutes) * 60.0
        + f64::from(seconds)
        + f64::from(microseconds) / 1_000_000.0;
    SqlValue::Float(if negative { -magnitude } else { magnitude })
}

/// Datetimes become ISO-8601 text without an offset.
pub fn from_datetime(value: NaiveDateTime) -> SqlValue {
    SqlValue::Text(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Timestamps are UTC and carry an explicit offset.
pub fn from_timestamp(value: DateTime<Utc>) -> SqlValue {
    SqlValue::Text(value.to_rfc3339())
}
