//! SQL literal rendering for PostgreSQL
//!
//! Every function returns text that can be embedded verbatim in a generated
//! script. Quoted text follows PostgreSQL's rules: single quotes are doubled
//! and any text containing a backslash is written as an `E'...'` escape
//! string with the backslash doubled, so the result does not depend on
//! `standard_conforming_strings`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Utc};
use num_bigint::{BigInt, Sign};
use std::fmt::Write;

/// Quote text as a PostgreSQL string literal.
///
/// NUL characters cannot be stored in PostgreSQL text and are dropped.
///
/// # Example
///
/// ```rust
/// use avro_to_postgres::convert::literal::quote_text;
///
/// assert_eq!(quote_text("it's"), "'it''s'");
/// assert_eq!(quote_text(r"C:\tmp"), r"E'C:\\tmp'");
/// ```
pub fn quote_text(text: &str) -> String {
    let text = text.replace('\0', "");
    let escaped = text.replace('\'', "''");
    if escaped.contains('\\') {
        format!("E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{}'", escaped)
    }
}

pub fn render_bool(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// Shortest round-trip rendering; non-finite values become typed literals.
pub fn render_double(value: f64) -> String {
    if value.is_nan() {
        "'NaN'::DOUBLE PRECISION".to_string()
    } else if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        format!("'{}Infinity'::DOUBLE PRECISION", sign)
    } else {
        format!("{:?}", value)
    }
}

pub fn render_float(value: f32) -> String {
    if value.is_nan() {
        "'NaN'::REAL".to_string()
    } else if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        format!("'{}Infinity'::REAL", sign)
    } else {
        format!("{:?}", value)
    }
}

/// `E'\\x<hex>'::BYTEA`
pub fn render_bytes(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{:02x}", byte);
    }
    format!("E'\\\\x{}'::BYTEA", hex)
}

/// Exact numeral for an unscaled two's-complement integer and a scale.
pub fn render_decimal(unscaled: &BigInt, scale: u32) -> String {
    let digits = unscaled.magnitude().to_string();
    let sign = if unscaled.sign() == Sign::Minus { "-" } else { "" };
    let scale = scale as usize;
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

/// Avro encodes `bytes` defaults as a string of code points 0-255.
pub fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

pub fn timestamp_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

pub fn date_from_days(days: i64) -> Option<NaiveDate> {
    DateTime::UNIX_EPOCH
        .date_naive()
        .checked_add_signed(TimeDelta::try_days(days)?)
}

pub fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

/// ISO-8601 with an explicit `+00:00` offset, e.g. `'2023-11-14T22:13:20+00:00'`.
pub fn render_timestamp(value: &DateTime<Utc>) -> String {
    quote_text(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

pub fn render_local_timestamp(value: &NaiveDateTime) -> String {
    quote_text(&value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

pub fn render_date(value: &NaiveDate) -> String {
    quote_text(&value.format("%Y-%m-%d").to_string())
}

pub fn render_time(value: &NaiveTime) -> String {
    quote_text(&value.format("%H:%M:%S%.f").to_string())
}
