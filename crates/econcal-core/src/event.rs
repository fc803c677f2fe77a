//! Canonical economic event types.
//!
//! This module provides the source-agnostic representation every fetcher
//! produces:
//! - [`EconomicEvent`]: one normalized calendar event
//! - [`Importance`]: the 0-3 severity scale driving filtering and presentation

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::EventTime;

/// Placeholder for forecast/previous/actual values the upstream left empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Title used when the upstream record has no usable name.
pub const FALLBACK_TITLE: &str = "Economic Event";

/// Severity of an economic event, from 0 (holiday / no impact) to 3 (high).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Importance(u8);

impl Importance {
    /// Bank holidays and other non-market-moving entries.
    pub const HOLIDAY: Self = Self(0);
    /// Low impact.
    pub const LOW: Self = Self(1);
    /// Medium impact.
    pub const MEDIUM: Self = Self(2);
    /// High impact.
    pub const HIGH: Self = Self(3);

    /// Creates an importance level, or `None` if `level` is above 3.
    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::HIGH.0).then_some(Self(level))
    }

    /// Creates an importance level, clamping anything above 3 to [`Importance::HIGH`].
    pub fn saturating(level: u8) -> Self {
        Self(level.min(Self::HIGH.0))
    }

    /// The numeric level.
    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Importance {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or_else(|| format!("importance must be 0-3, got {}", level))
    }
}

impl From<Importance> for u8 {
    fn from(importance: Importance) -> Self {
        importance.0
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.0 {
            0 => "holiday",
            1 => "low",
            2 => "medium",
            _ => "high",
        };
        f.write_str(label)
    }
}

/// A normalized economic calendar event.
///
/// Every fetcher maps its upstream payload into this shape so the
/// reconciler never needs to know which data source was used. The `id` is
/// the idempotency key stored in the calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicEvent {
    /// Stable synthetic identifier, unique within a run.
    pub id: String,
    /// Display title (e.g. "Non Farm Payrolls").
    pub name: String,
    /// Locale code of the region the event pertains to (e.g. "USD").
    pub country: String,
    /// Placement on the calendar.
    pub time: EventTime,
    /// Consensus forecast, or "N/A".
    pub forecast: String,
    /// Previous period value, or "N/A".
    pub previous: String,
    /// Released value, or "N/A".
    pub actual: String,
    /// Severity level.
    pub importance: Importance,
    /// Indicator category (e.g. "Interest Rate").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Unit of the published values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Currency the event is quoted in, when the source distinguishes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Link to the official release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl EconomicEvent {
    /// Creates an event with the required fields; values default to "N/A".
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        country: impl Into<String>,
        time: EventTime,
    ) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            name
        };
        Self {
            id: id.into(),
            name,
            country: country.into(),
            time,
            forecast: NOT_AVAILABLE.to_string(),
            previous: NOT_AVAILABLE.to_string(),
            actual: NOT_AVAILABLE.to_string(),
            importance: Importance::HOLIDAY,
            category: None,
            unit: None,
            currency: None,
            source_url: None,
        }
    }

    /// The scheduled instant, or `None` for all-day events.
    pub fn scheduled_time_utc(&self) -> Option<DateTime<Utc>> {
        self.time.scheduled_time_utc()
    }

    /// The date used for range filtering and all-day placement.
    pub fn effective_date(&self) -> NaiveDate {
        self.time.date()
    }

    /// Returns `true` if the event has no scheduled instant.
    pub fn is_all_day(&self) -> bool {
        self.time.is_all_day()
    }

    /// Builder method to set the importance.
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    /// Builder method to set the forecast; blank values stay "N/A".
    pub fn with_forecast(mut self, value: Option<String>) -> Self {
        self.forecast = or_not_available(value);
        self
    }

    /// Builder method to set the previous value; blank values stay "N/A".
    pub fn with_previous(mut self, value: Option<String>) -> Self {
        self.previous = or_not_available(value);
        self
    }

    /// Builder method to set the actual value; blank values stay "N/A".
    pub fn with_actual(mut self, value: Option<String>) -> Self {
        self.actual = or_not_available(value);
        self
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Builder method to set the unit.
    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    /// Builder method to set the currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Builder method to set the source link.
    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }
}

fn or_not_available(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn nfp() -> EconomicEvent {
        EconomicEvent::new(
            "Non Farm Payrolls_2026-02-20T08:30:00-05:00_USD",
            "Non Farm Payrolls",
            "USD",
            EventTime::from_utc(Utc.with_ymd_and_hms(2026, 2, 20, 13, 30, 0).unwrap()),
        )
    }

    mod importance {
        use super::*;

        #[test]
        fn accepts_zero_to_three() {
            for level in 0..=3 {
                assert_eq!(Importance::new(level).unwrap().level(), level);
            }
            assert!(Importance::new(4).is_none());
        }

        #[test]
        fn saturating_clamps() {
            assert_eq!(Importance::saturating(9), Importance::HIGH);
            assert_eq!(Importance::saturating(2), Importance::MEDIUM);
        }

        #[test]
        fn ordering_follows_level() {
            assert!(Importance::HIGH > Importance::MEDIUM);
            assert!(Importance::LOW > Importance::HOLIDAY);
        }

        #[test]
        fn serde_uses_plain_integer() {
            assert_eq!(serde_json::to_string(&Importance::HIGH).unwrap(), "3");
            let parsed: Importance = serde_json::from_str("2").unwrap();
            assert_eq!(parsed, Importance::MEDIUM);
            assert!(serde_json::from_str::<Importance>("7").is_err());
        }

        #[test]
        fn display_labels() {
            assert_eq!(Importance::HOLIDAY.to_string(), "holiday");
            assert_eq!(Importance::HIGH.to_string(), "high");
        }
    }

    mod economic_event {
        use super::*;

        #[test]
        fn values_default_to_not_available() {
            let event = nfp();
            assert_eq!(event.forecast, NOT_AVAILABLE);
            assert_eq!(event.previous, NOT_AVAILABLE);
            assert_eq!(event.actual, NOT_AVAILABLE);
            assert_eq!(event.importance, Importance::HOLIDAY);
        }

        #[test]
        fn blank_values_stay_not_available() {
            let event = nfp()
                .with_forecast(Some("180K".into()))
                .with_previous(Some("  ".into()))
                .with_actual(None);
            assert_eq!(event.forecast, "180K");
            assert_eq!(event.previous, NOT_AVAILABLE);
            assert_eq!(event.actual, NOT_AVAILABLE);
        }

        #[test]
        fn blank_name_falls_back() {
            let event = EconomicEvent::new(
                "x",
                "   ",
                "USD",
                EventTime::from_date(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()),
            );
            assert_eq!(event.name, FALLBACK_TITLE);
        }

        #[test]
        fn effective_date_follows_placement() {
            let timed = nfp();
            assert_eq!(
                timed.effective_date(),
                NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
            );
            assert!(timed.scheduled_time_utc().is_some());

            let holiday = EconomicEvent::new(
                "holiday",
                "Bank Holiday",
                "USD",
                EventTime::from_date(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()),
            );
            assert!(holiday.is_all_day());
            assert_eq!(
                holiday.effective_date(),
                NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()
            );
        }

        #[test]
        fn optional_fields_are_omitted_from_json() {
            let json = serde_json::to_value(nfp().with_importance(Importance::HIGH)).unwrap();
            assert_eq!(json["importance"], 3);
            assert!(json.get("category").is_none());
            assert!(json.get("source_url").is_none());
        }
    }
}
