//! Financial Modeling Prep economic calendar fetcher.
//!
//! FMP needs an API key. Without one the fetcher returns nothing and makes
//! no request.

use std::time::Duration;

use tracing::{info, warn};

use econcal_core::{EconomicEvent, EventTime, Importance};

use crate::error::SourceResult;
use crate::feed::JsonFeed;
use crate::normalize::{
    COUNTRY_KEYS, FetchRequest, RecordTranslator, TITLE_KEYS, normalize_records,
};
use crate::raw_record::RawRecord;
use crate::source::{BoxFuture, EventSource, RecordFeed};

/// Registry name.
pub const SOURCE_NAME: &str = "fmp";

/// Economic calendar endpoint.
pub const CALENDAR_URL: &str = "https://financialmodelingprep.com/api/v3/economic_calendar";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "apikey";

/// Two-letter country codes mapped to the locale codes used everywhere else.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("US", "USD"),
    ("JP", "JPY"),
    ("GB", "GBP"),
    ("EU", "EUR"),
    ("CA", "CAD"),
    ("AU", "AUD"),
    ("NZ", "NZD"),
    ("CH", "CHF"),
];

/// Maps an FMP country code to a locale code, or `None` if unmapped.
pub fn locale_for_country(country: &str) -> Option<&'static str> {
    let country = country.trim().to_uppercase();
    COUNTRY_CODES
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, locale)| *locale)
}

/// Maps FMP's impact labels to the importance scale.
pub fn impact_level(impact: &str) -> Importance {
    match impact.trim().to_lowercase().as_str() {
        "high" => Importance::HIGH,
        "medium" => Importance::MEDIUM,
        "low" => Importance::LOW,
        _ => Importance::HOLIDAY,
    }
}

/// Translation of FMP records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FmpRecords;

impl RecordTranslator for FmpRecords {
    fn id_prefix(&self) -> Option<&str> {
        Some(SOURCE_NAME)
    }

    fn locale(&self, record: &RawRecord) -> String {
        locale_for_country(&record.text_or_empty(COUNTRY_KEYS))
            .unwrap_or_default()
            .to_string()
    }

    fn importance(&self, record: &RawRecord) -> Importance {
        impact_level(&record.text_or_empty(&["impact"]))
    }

    fn translate(
        &self,
        record: &RawRecord,
        id: String,
        locale: String,
        importance: Importance,
        time: EventTime,
    ) -> EconomicEvent {
        let mut event = EconomicEvent::new(id, record.text_or_empty(TITLE_KEYS), locale, time)
            .with_importance(importance)
            .with_forecast(record.text(&["estimate", "consensus"]))
            .with_previous(record.text(&["previous"]))
            .with_actual(record.text(&["actual"]))
            .with_unit(record.text(&["unit"]));
        if let Some(currency) = record.text(&["currency"]) {
            event = event.with_currency(currency);
        }
        event
    }
}

/// Fetcher for the FMP economic calendar.
pub struct FmpSource {
    feed: Option<Box<dyn RecordFeed>>,
}

impl FmpSource {
    /// Creates a fetcher over `feed`; `None` means no API key is configured.
    pub fn new(feed: Option<Box<dyn RecordFeed>>) -> Self {
        Self { feed }
    }

    /// Creates the HTTP fetcher; a missing or blank key yields an inert fetcher.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_api_key(
        api_key: Option<&str>,
        timeout: Duration,
        user_agent: &str,
    ) -> SourceResult<Self> {
        let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(Self::new(None));
        };
        let feed = JsonFeed::new(SOURCE_NAME, CALENDAR_URL, timeout, user_agent)?
            .with_header(API_KEY_HEADER, key)
            .with_range_query("from", "to");
        Ok(Self::new(Some(Box::new(feed))))
    }

    /// Returns true if a credential is configured.
    pub fn is_configured(&self) -> bool {
        self.feed.is_some()
    }
}

impl EventSource for FmpSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Vec<EconomicEvent>> {
        Box::pin(async move {
            let Some(ref feed) = self.feed else {
                info!("FMP_API_KEY not configured, skipping {}", SOURCE_NAME);
                return Vec::new();
            };

            let records = match feed.fetch_records(&request.range).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("{} unavailable: {}", SOURCE_NAME, e);
                    return Vec::new();
                }
            };

            let (events, stats) = normalize_records(&FmpRecords, records, request);
            info!(
                "{}: {} events from {} records",
                SOURCE_NAME, stats.emitted, stats.input
            );
            events
        })
    }
}
