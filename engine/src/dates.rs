//! Date parsing and age arithmetic
//!
//! All math is done on plain calendar dates (`chrono::NaiveDate`), never
//! through a local timezone, so month/day comparisons are stable no matter
//! where the caller runs.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Placeholder shown when a date is unrecorded or unparsable.
pub const UNKNOWN_DATE: &str = "not recorded";

#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("unrecognized date format: {0:?}")]
    Unrecognized(String),
}

/// Parse a date in either of the two formats found in the source records:
/// ISO `YYYY-MM-DD` or day-first `DD/MM/YYYY`.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateParseError> {
    let text = text.trim();
    let format = if text.contains('/') { "%d/%m/%Y" } else { "%Y-%m-%d" };
    NaiveDate::parse_from_str(text, format)
        .map_err(|_| DateParseError::Unrecognized(text.to_string()))
}

/// Whole years elapsed from `birth` to `as_of`, clamped non-negative.
///
/// Calendar-exact: the naive year difference is decremented by one when the
/// as-of month/day falls before the birth month/day.
pub fn age_on(birth: NaiveDate, as_of: NaiveDate) -> u32 {
    let mut years = as_of.year() - birth.year();
    if (as_of.month(), as_of.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Day-first human string, or the explicit unknown placeholder.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// Re-anchor a date's month/day onto another year. Feb 29 rolls over to
/// Mar 1 outside leap years.
pub fn anchor_to_year(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 3, 1).unwrap())
}
