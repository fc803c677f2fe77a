//! Calendar entry payloads.
//!
//! These types serialize to the Google Calendar v3 event resource shape,
//! which is also what [`MemoryCalendar`](crate::MemoryCalendar) stores.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryTime {
    /// A timed boundary, rendered in the calendar's timezone.
    Timed {
        /// The instant.
        #[serde(rename = "dateTime")]
        date_time: DateTime<Utc>,
        /// IANA timezone name used for display.
        #[serde(rename = "timeZone")]
        time_zone: String,
    },
    /// An all-day boundary.
    AllDay {
        /// The date.
        date: NaiveDate,
    },
}

impl EntryTime {
    /// The boundary as a UTC instant (midnight UTC for all-day boundaries).
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Timed { date_time, .. } => *date_time,
            Self::AllDay { date } => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// One reminder override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    /// Delivery method, e.g. "popup".
    pub method: String,
    /// Lead time before the start.
    pub minutes: u32,
}

/// Reminder settings of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    /// Whether the calendar's default reminders apply.
    pub use_default: bool,
    /// Explicit reminders.
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    /// Popup reminders at the given lead times, calendar defaults disabled.
    pub fn popups(minutes: &[u32]) -> Self {
        Self {
            use_default: false,
            overrides: minutes
                .iter()
                .map(|&minutes| ReminderOverride {
                    method: "popup".to_string(),
                    minutes,
                })
                .collect(),
        }
    }
}

/// Key-value metadata attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    /// Properties visible only to this application.
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

/// The full body sent on insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBody {
    /// Title.
    pub summary: String,
    /// Free-text body.
    pub description: String,
    /// Start boundary.
    pub start: EntryTime,
    /// End boundary.
    pub end: EntryTime,
    /// Reminder settings.
    pub reminders: Reminders,
    /// Private metadata.
    pub extended_properties: ExtendedProperties,
    /// Palette color id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl EntryBody {
    /// Returns a private metadata value.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.extended_properties.private.get(key).map(String::as_str)
    }
}

/// An entry already present in the calendar, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingEntry {
    /// Backend identifier.
    pub id: String,
    /// Private metadata, absent on entries this tool did not create.
    #[serde(default)]
    pub extended_properties: Option<ExtendedProperties>,
}

impl ExistingEntry {
    /// Returns a private metadata value.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.extended_properties
            .as_ref()
            .and_then(|props| props.private.get(key))
            .map(String::as_str)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPage {
    /// Entries on this page.
    pub entries: Vec<ExistingEntry>,
    /// Continuation token; `None` on the last page.
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn body() -> EntryBody {
        EntryBody {
            summary: "🇺🇸 ★★★ Non Farm Payrolls".to_string(),
            description: "Forecast: 180K\nPrevious: 256K\nActual: N/A".to_string(),
            start: EntryTime::Timed {
                date_time: Utc.with_ymd_and_hms(2026, 2, 20, 13, 30, 0).unwrap(),
                time_zone: "Asia/Tokyo".to_string(),
            },
            end: EntryTime::Timed {
                date_time: Utc.with_ymd_and_hms(2026, 2, 20, 14, 0, 0).unwrap(),
                time_zone: "Asia/Tokyo".to_string(),
            },
            reminders: Reminders::popups(&[40, 10]),
            extended_properties: ExtendedProperties {
                private: BTreeMap::from([("econ_event_id".to_string(), "nfp".to_string())]),
            },
            color_id: Some("11".to_string()),
        }
    }

    #[test]
    fn serializes_to_google_shape() {
        let value = serde_json::to_value(body()).unwrap();
        assert_eq!(
            value,
            json!({
                "summary": "🇺🇸 ★★★ Non Farm Payrolls",
                "description": "Forecast: 180K\nPrevious: 256K\nActual: N/A",
                "start": {"dateTime": "2026-02-20T13:30:00Z", "timeZone": "Asia/Tokyo"},
                "end": {"dateTime": "2026-02-20T14:00:00Z", "timeZone": "Asia/Tokyo"},
                "reminders": {
                    "useDefault": false,
                    "overrides": [
                        {"method": "popup", "minutes": 40},
                        {"method": "popup", "minutes": 10}
                    ]
                },
                "extendedProperties": {"private": {"econ_event_id": "nfp"}},
                "colorId": "11"
            })
        );
    }

    #[test]
    fn all_day_and_no_color() {
        let mut body = body();
        body.start = EntryTime::AllDay {
            date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
        };
        body.end = EntryTime::AllDay {
            date: NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
        };
        body.color_id = None;

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["start"], json!({"date": "2026-02-16"}));
        assert_eq!(value["end"], json!({"date": "2026-02-17"}));
        assert!(value.get("colorId").is_none());

        let back: EntryBody = serde_json::from_value(value).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn existing_entry_from_listing_item() {
        let item = json!({
            "id": "abc123",
            "status": "confirmed",
            "summary": "🇯🇵 ★★★ CPI y/y",
            "extendedProperties": {"private": {"econ_event_id": "cpi"}}
        });
        let entry: ExistingEntry = serde_json::from_value(item).unwrap();
        assert_eq!(entry.metadata("econ_event_id"), Some("cpi"));

        let foreign: ExistingEntry = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(foreign.metadata("econ_event_id"), None);
    }
}
