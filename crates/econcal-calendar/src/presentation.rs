//! Mapping of canonical events to calendar entry bodies.

use std::collections::BTreeMap;

use chrono::Duration;

use econcal_core::{EconomicEvent, EventTime, Importance};

use crate::entry::{EntryBody, EntryTime, ExtendedProperties, Reminders};

/// Private metadata key holding the event id.
pub const DEFAULT_METADATA_KEY: &str = "econ_event_id";

/// Display timezone for timed entries.
pub const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";

/// Length of timed entries.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Popup reminder lead times.
pub const DEFAULT_REMINDER_MINUTES: &[u32] = &[40, 10];

/// Palette color for high importance events (tomato).
pub const DEFAULT_URGENT_COLOR: &str = "11";

/// Palette color for medium importance events (banana).
pub const DEFAULT_ATTENTION_COLOR: &str = "5";

const DEFAULT_FLAGS: &[(&str, &str)] = &[
    ("USD", "🇺🇸"),
    ("JPY", "🇯🇵"),
    ("EUR", "🇪🇺"),
    ("GBP", "🇬🇧"),
    ("AUD", "🇦🇺"),
    ("CAD", "🇨🇦"),
    ("CHF", "🇨🇭"),
    ("NZD", "🇳🇿"),
    ("CNY", "🇨🇳"),
];

/// How events are rendered as calendar entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationConfig {
    /// IANA timezone attached to timed boundaries.
    pub time_zone: String,
    /// Length of timed entries.
    pub duration_minutes: u32,
    /// Popup reminder lead times, in minutes.
    pub reminder_minutes: Vec<u32>,
    /// Locale code to flag marker.
    pub flags: BTreeMap<String, String>,
    /// Color id for importance 3.
    pub urgent_color: String,
    /// Color id for importance 2.
    pub attention_color: String,
    /// Private metadata key carrying the event id.
    pub metadata_key: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            reminder_minutes: DEFAULT_REMINDER_MINUTES.to_vec(),
            flags: DEFAULT_FLAGS
                .iter()
                .map(|(code, flag)| (code.to_string(), flag.to_string()))
                .collect(),
            urgent_color: DEFAULT_URGENT_COLOR.to_string(),
            attention_color: DEFAULT_ATTENTION_COLOR.to_string(),
            metadata_key: DEFAULT_METADATA_KEY.to_string(),
        }
    }
}

impl PresentationConfig {
    /// Builder method to set the display timezone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Builder method to set the timed entry length.
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Builder method to set the reminder lead times.
    pub fn with_reminders(mut self, minutes: Vec<u32>) -> Self {
        self.reminder_minutes = minutes;
        self
    }

    /// Star marker and color id for an importance level.
    pub fn style_for(&self, importance: Importance) -> (&'static str, Option<&str>) {
        match importance {
            Importance::HIGH => ("★★★", Some(self.urgent_color.as_str())),
            Importance::MEDIUM => ("★★", Some(self.attention_color.as_str())),
            _ => ("", None),
        }
    }

    /// Entry title: flag, stars and name, blank parts dropped.
    pub fn title(&self, event: &EconomicEvent) -> String {
        let flag = self.flags.get(&event.country).map(String::as_str).unwrap_or("");
        let (stars, _) = self.style_for(event.importance);
        [flag, stars, event.name.as_str()]
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the full entry body for `event`.
    pub fn build_entry(&self, event: &EconomicEvent) -> EntryBody {
        let (start, end) = match event.time {
            EventTime::DateTime(start) => (
                EntryTime::Timed {
                    date_time: start,
                    time_zone: self.time_zone.clone(),
                },
                EntryTime::Timed {
                    date_time: start + Duration::minutes(i64::from(self.duration_minutes)),
                    time_zone: self.time_zone.clone(),
                },
            ),
            EventTime::AllDay(date) => (
                EntryTime::AllDay { date },
                EntryTime::AllDay {
                    date: date.succ_opt().unwrap_or(date),
                },
            ),
        };

        let (_, color) = self.style_for(event.importance);

        EntryBody {
            summary: self.title(event),
            description: description(event),
            start,
            end,
            reminders: Reminders::popups(&self.reminder_minutes),
            extended_properties: ExtendedProperties {
                private: BTreeMap::from([(self.metadata_key.clone(), event.id.clone())]),
            },
            color_id: color.map(String::from),
        }
    }
}

/// Forecast, previous and actual values, one per line.
pub fn description(event: &EconomicEvent) -> String {
    let mut text = format!(
        "Forecast: {}\nPrevious: {}\nActual: {}",
        event.forecast, event.previous, event.actual
    );
    if let Some(ref url) = event.source_url {
        text.push_str("\n\n");
        text.push_str(url);
    }
    text
}
