use crate::error::{FarmReportError, Result};
use chrono::{DateTime, Days, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Parses either a plain `YYYY-MM-DD` date or an RFC 3339 timestamp,
/// keeping only the calendar date.
pub fn parse_flexible_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }

    // Timestamps without an offset, e.g. "2024-03-01T10:00:00"
    if let Some((date_part, _)) = trimmed.split_once('T') {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return Ok(date);
        }
    }

    Err(FarmReportError::DateError(format!(
        "Invalid date: {}. Expected YYYY-MM-DD or an RFC 3339 timestamp",
        input
    )))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_date(&raw).map_err(serde::de::Error::custom)
}

/// The first day still inside a "last N days" window ending at `reference`.
pub fn window_start(reference: NaiveDate, days: u32) -> NaiveDate {
    reference
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Case-insensitive substring test. `needle` is expected to be lowercase already.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// ISO-like date stamp used in export names.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Division that yields 0 instead of NaN or infinity.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        let ratio = numerator / denominator;
        if ratio.is_finite() {
            return ratio;
        }
    }
    0.0
}
