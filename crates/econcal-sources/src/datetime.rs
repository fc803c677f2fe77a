//! Upstream date parsing.
//!
//! Feeds disagree on date formats. ForexFactory publishes RFC 3339 with the
//! New York offset, FMP publishes naive `YYYY-MM-DD HH:MM:SS` in UTC, and
//! scraped calendars sometimes carry only a date. Everything is normalized
//! to an [`EventTime`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use econcal_core::EventTime;

/// Timestamp layouts that carry an explicit offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Timestamp layouts without an offset; these are taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an upstream date string.
///
/// - timestamps with an offset are converted to UTC
/// - timestamps without an offset are interpreted as UTC
/// - a bare `YYYY-MM-DD` becomes an all-day event
///
/// Returns `None` for blank or unparseable input; callers drop the record.
pub fn parse_event_time(input: &str) -> Option<EventTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(EventTime::from_utc(dt.with_timezone(&Utc)));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(EventTime::from_utc(dt.with_timezone(&Utc)));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(EventTime::from_utc(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(EventTime::from_date)
}
