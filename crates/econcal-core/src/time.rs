//! Time types for economic events.
//!
//! This module provides [`EventTime`] for the placement of an event on the
//! calendar (either a specific instant or a whole day), and [`DateRange`]
//! for the inclusive date window a sync run covers.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an event sits on the calendar.
///
/// Upstream feeds either publish a release instant (most indicators) or only
/// a date (bank holidays, tentative releases). Exactly one of the two is
/// authoritative, which is why this is an enum rather than a pair of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A scheduled instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event on the given date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a timed event placement.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates an all-day event placement.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` for all-day placements.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// The scheduled instant, or `None` for all-day events.
    pub fn scheduled_time_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::AllDay(_) => None,
        }
    }

    /// The calendar date of the event.
    ///
    /// For timed events this is the UTC date of the instant.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

/// An inclusive range of calendar dates, `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Creates a range, or `None` when `from` is after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    /// A range starting at `today` and spanning `weeks` weeks ahead.
    ///
    /// Returns `None` when the end date would overflow the calendar.
    pub fn lookahead(today: NaiveDate, weeks: u32) -> Option<Self> {
        let to = today.checked_add_signed(Duration::try_weeks(i64::from(weeks))?)?;
        Some(Self { from: today, to })
    }

    /// A range covering a single day.
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// First day of the range.
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the range (inclusive).
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Returns `true` if `date` lies within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Lower bound for calendar queries: midnight UTC on the first day.
    pub fn time_min(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Upper bound for calendar queries: 23:59:59 UTC on the last day.
    pub fn time_max(&self) -> DateTime<Utc> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.to.and_time(end_of_day).and_utc()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}
