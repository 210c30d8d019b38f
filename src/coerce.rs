//! Tolerant coercion of raw spreadsheet cell values into typed values.
//!
//! Cells in the published workbook are a free-for-all: currency strings with
//! `$` and thousands separators, non-breaking spaces pasted in from the web,
//! Excel serial-date numbers, and locale date strings, often all within one
//! column. Every function here is total: bad input yields `None`, never an
//! error, and the caller decides what the default is at the point of use.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A raw cell value as read from one sheet position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// True for the values a spreadsheet treats as "nothing here": a missing
    /// cell or an empty/whitespace-only string.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The display text of the cell, cleaned but with casing preserved.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => clean_text(s),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Day zero of the workbook's serial date encoding.
///
/// Excel serial 1 is 1900-01-01, and the format carries the famous phantom
/// leap day 1900-02-29, so the effective epoch for modern dates is
/// 1899-12-30.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch date")
}

/// Converts an Excel-style serial number to a datetime: integer part is days
/// since the epoch, fractional part is time-of-day. Everything is treated as
/// UTC so day boundaries do not shift with the host timezone.
pub fn datetime_from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as u64;
    let secs = (serial.fract() * 86_400.0).round() as u32;
    let date = serial_epoch().checked_add_days(Days::new(days))?;
    let time = if secs >= 86_400 {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?
    };
    Some(date.and_time(time))
}

/// Parses a numeric string that may carry a currency symbol, thousands
/// separators, and non-breaking spaces. `None` for empty or unparseable
/// input.
pub fn number_from_str(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '\u{a0}') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Coerces any cell to a number. Text goes through [`number_from_str`];
/// dates and booleans are not numbers.
pub fn coerce_number(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(n) => Decimal::from_f64(*n),
        Cell::Text(s) => number_from_str(s),
        _ => None,
    }
}

/// Coerces any cell to a datetime: native values pass through, numbers are
/// treated as workbook date serials, strings are matched against the formats
/// seen in the source data. `None` means "unknown", not "invalid".
pub fn coerce_datetime(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Number(n) => datetime_from_serial(*n),
        Cell::Text(s) => datetime_from_str(s),
        _ => None,
    }
}

/// Day-granularity variant of [`coerce_datetime`].
pub fn coerce_date(cell: &Cell) -> Option<NaiveDate> {
    coerce_datetime(cell).map(|dt| dt.date())
}

fn datetime_from_str(raw: &str) -> Option<NaiveDateTime> {
    let s = clean_text(raw);
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%B %e, %Y", "%b %e, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    numeric_locale_date(&s).map(|d| d.and_time(NaiveTime::MIN))
}

/// Matches `M/D/YYYY` and `M-D-YY` style dates. Two-digit years pivot to
/// 2000 + yy, which is correct for this data set (nothing predates 2020).
fn numeric_locale_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = if s.contains('/') {
        s.split('/').collect()
    } else if s.contains('-') {
        s.split('-').collect()
    } else {
        return None;
    };
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let year_raw = parts[2].trim();
    let year: i32 = year_raw.parse().ok()?;
    let year = if year_raw.len() <= 2 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalization applied to every join/lookup key: non-breaking spaces become
/// ordinary spaces, whitespace runs collapse, and the result is trimmed and
/// lowercased. Display strings keep their original casing and spacing.
pub fn normalize_key(s: &str) -> String {
    s.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cleans a display string without changing its casing.
pub fn clean_text(s: &str) -> String {
    s.replace('\u{a0}', " ").trim().to_string()
}
