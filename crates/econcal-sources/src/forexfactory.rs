//! ForexFactory aggregating fetcher.
//!
//! ForexFactory publishes its calendar as weekly JSON exports. The "this
//! week" export is always available and is the primary feed. A wider-range
//! supplementary feed (by default the "next week" export) extends coverage
//! over the lookahead window. Both feeds share the same record shape:
//!
//! ```json
//! {"title": "Non Farm Payrolls", "country": "USD",
//!  "date": "2026-02-20T08:30:00-05:00", "impact": "High",
//!  "forecast": "180K", "previous": "256K"}
//! ```

use tracing::{info, warn};

use econcal_core::{EconomicEvent, EventTime, Importance};

use crate::normalize::{
    COUNTRY_KEYS, FetchRequest, RecordTranslator, TITLE_KEYS, normalize_records,
};
use crate::raw_record::RawRecord;
use crate::source::{BoxFuture, EventSource, RecordFeed};

/// Registry name.
pub const SOURCE_NAME: &str = "forexfactory";

/// The "this week" JSON export.
pub const THIS_WEEK_URL: &str = "https://nfs.faireconomy.media/ff_calendar_thisweek.json";

/// The "next week" JSON export.
pub const NEXT_WEEK_URL: &str = "https://nfs.faireconomy.media/ff_calendar_nextweek.json";

/// Maps ForexFactory's impact labels to the importance scale.
pub fn impact_level(impact: &str) -> Importance {
    match impact.trim().to_lowercase().as_str() {
        "high" => Importance::HIGH,
        "medium" => Importance::MEDIUM,
        "low" => Importance::LOW,
        _ => Importance::HOLIDAY,
    }
}

/// Translation of ForexFactory records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForexFactoryRecords;

impl RecordTranslator for ForexFactoryRecords {
    fn locale(&self, record: &RawRecord) -> String {
        record.text_or_empty(COUNTRY_KEYS).to_uppercase()
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
        EconomicEvent::new(id, record.text_or_empty(TITLE_KEYS), locale, time)
            .with_importance(importance)
            .with_forecast(record.text(&["forecast"]))
            .with_previous(record.text(&["previous"]))
            .with_actual(record.text(&["actual"]))
            .with_source_url(record.text(&["url"]))
    }
}

/// Fetcher combining the primary feed with an optional supplementary feed.
pub struct ForexFactorySource {
    primary: Box<dyn RecordFeed>,
    supplementary: Option<Box<dyn RecordFeed>>,
}

impl ForexFactorySource {
    /// Creates a fetcher with only the primary feed.
    pub fn new(primary: Box<dyn RecordFeed>) -> Self {
        Self {
            primary,
            supplementary: None,
        }
    }

    /// Builder method to add the supplementary feed.
    pub fn with_supplementary(mut self, feed: Box<dyn RecordFeed>) -> Self {
        self.supplementary = Some(feed);
        self
    }

    /// Fetches primary then supplementary records, primary first.
    async fn collect(&self, request: &FetchRequest) -> Vec<RawRecord> {
        let mut records = match self.primary.fetch_records(&request.range).await {
            Ok(records) => records,
            Err(e) => {
                warn!("primary feed unavailable, continuing without it: {}", e);
                Vec::new()
            }
        };

        if let Some(ref feed) = self.supplementary {
            match feed.fetch_records(&request.range).await {
                Ok(more) => records.extend(more),
                Err(e) => warn!("supplementary feed unavailable, partial results: {}", e),
            }
        }

        records
    }
}

impl EventSource for ForexFactorySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Vec<EconomicEvent>> {
        Box::pin(async move {
            let records = self.collect(request).await;
            let (events, stats) = normalize_records(&ForexFactoryRecords, records, request);
            info!(
                "{}: {} events from {} records",
                SOURCE_NAME, stats.emitted, stats.input
            );
            events
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceErrorCode;
    use crate::feed::StaticFeed;
    use chrono::{NaiveDate, TimeZone, Timelike, Utc};
    use econcal_core::{DateRange, NOT_AVAILABLE};
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ff(title: &str, country: &str, raw_date: &str, impact: &str) -> RawRecord {
        RawRecord::new()
            .with("title", title)
            .with("country", country)
            .with("date", raw_date)
            .with("impact", impact)
    }

    fn this_week() -> Vec<RawRecord> {
        vec![
            ff("Non Farm Payrolls", "USD", "2026-02-20T08:30:00-05:00", "High")
                .with("forecast", "180K")
                .with("previous", "256K"),
            ff("CPI y/y", "JPY", "2026-02-19T18:30:00-05:00", "High")
                .with("forecast", "3.2%")
                .with("previous", "3.6%"),
            ff("Retail Sales m/m", "GBP", "2026-02-20T02:00:00-05:00", "High"),
            ff("Empire State Manufacturing Index", "USD", "2026-02-17T08:30:00-05:00", "Medium"),
            ff("Bank Holiday", "USD", "2026-02-16T08:00:00-05:00", "Holiday"),
        ]
    }

    fn request(importance_min: Importance) -> FetchRequest {
        FetchRequest::new(
            DateRange::new(date(2026, 2, 15), date(2026, 3, 14)).unwrap(),
            ["USD", "JPY"],
            importance_min,
        )
    }

    fn source(supplementary: Option<StaticFeed>) -> ForexFactorySource {
        let source = ForexFactorySource::new(Box::new(StaticFeed::new("ff-thisweek", this_week())));
        match supplementary {
            Some(feed) => source.with_supplementary(Box::new(feed)),
            None => source,
        }
    }

    #[test]
    fn impact_vocabulary() {
        assert_eq!(impact_level("High"), Importance::HIGH);
        assert_eq!(impact_level("MEDIUM"), Importance::MEDIUM);
        assert_eq!(impact_level(" low "), Importance::LOW);
        assert_eq!(impact_level("Holiday"), Importance::HOLIDAY);
        assert_eq!(impact_level("Non-Economic"), Importance::HOLIDAY);
        assert_eq!(impact_level(""), Importance::HOLIDAY);
    }

    #[tokio::test]
    async fn filters_country_and_importance() {
        let events = source(None).fetch(&request(Importance::MEDIUM)).await;
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Non Farm Payrolls", "CPI y/y", "Empire State Manufacturing Index"]
        );
    }

    #[tokio::test]
    async fn high_only_drops_medium() {
        let events = source(None).fetch(&request(Importance::HIGH)).await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.importance == Importance::HIGH));
    }

    #[tokio::test]
    async fn converts_to_utc_and_keeps_values() {
        let events = source(None).fetch(&request(Importance::HIGH)).await;
        let nfp = &events[0];
        let start = nfp.scheduled_time_utc().unwrap();
        assert_eq!((start.hour(), start.minute()), (13, 30));
        assert_eq!(nfp.forecast, "180K");
        assert_eq!(nfp.previous, "256K");
        assert_eq!(nfp.actual, NOT_AVAILABLE);
        assert_eq!(nfp.country, "USD");

        let cpi = &events[1];
        assert_eq!(
            cpi.scheduled_time_utc(),
            Some(Utc.with_ymd_and_hms(2026, 2, 19, 23, 30, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn holiday_threshold_includes_bank_holiday() {
        let events = source(None).fetch(&request(Importance::HOLIDAY)).await;
        assert!(events.iter().any(|e| e.name == "Bank Holiday"));
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn range_excludes_outside_dates() {
        let narrow = FetchRequest::new(
            DateRange::single_day(date(2026, 2, 17)),
            ["USD", "JPY"],
            Importance::MEDIUM,
        );
        let events = source(None).fetch(&narrow).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Empire State Manufacturing Index");
    }

    #[tokio::test]
    async fn supplementary_duplicates_are_merged_primary_wins() {
        let overlap = vec![
            ff("Non Farm Payrolls", "USD", "2026-02-20T08:30:00-05:00", "High")
                .with("forecast", "999K"),
            ff("Unemployment Rate", "JPY", "2026-02-27T18:30:00-05:00", "Medium"),
        ];
        let events = source(Some(StaticFeed::new("ff-nextweek", overlap)))
            .fetch(&request(Importance::MEDIUM))
            .await;

        let ids: HashSet<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), events.len());
        assert_eq!(events.len(), 4);

        let nfp = events.iter().find(|e| e.name == "Non Farm Payrolls").unwrap();
        assert_eq!(nfp.forecast, "180K");
        assert!(events.iter().any(|e| e.name == "Unemployment Rate"));
    }

    #[tokio::test]
    async fn identical_feeds_yield_unique_ids() {
        let events = source(Some(StaticFeed::new("ff-nextweek", this_week())))
            .fetch(&request(Importance::HOLIDAY))
            .await;
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn supplementary_failure_is_partial_result() {
        let failing = StaticFeed::failing("ff-nextweek", SourceErrorCode::NetworkError, "timeout");
        let events = source(Some(failing)).fetch(&request(Importance::HIGH)).await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn primary_failure_degrades() {
        let source = ForexFactorySource::new(Box::new(StaticFeed::failing(
            "ff-thisweek",
            SourceErrorCode::InvalidResponse,
            "expected a JSON array",
        )));
        assert!(source.fetch(&request(Importance::HOLIDAY)).await.is_empty());

        let with_fallback = ForexFactorySource::new(Box::new(StaticFeed::failing(
            "ff-thisweek",
            SourceErrorCode::ServerError,
            "503",
        )))
        .with_supplementary(Box::new(StaticFeed::new("ff-nextweek", this_week())));
        assert_eq!(with_fallback.fetch(&request(Importance::HIGH)).await.len(), 2);
    }

    #[tokio::test]
    async fn empty_payload_is_empty_result() {
        let source = ForexFactorySource::new(Box::new(StaticFeed::new("ff-thisweek", vec![])));
        assert!(source.fetch(&request(Importance::HOLIDAY)).await.is_empty());
    }

    #[tokio::test]
    async fn blank_title_falls_back() {
        let record = ff("  ", "USD", "2026-02-18", "High");
        let source = ForexFactorySource::new(Box::new(StaticFeed::new("ff-thisweek", vec![record])));
        let events = source.fetch(&request(Importance::HIGH)).await;
        assert_eq!(events[0].name, econcal_core::FALLBACK_TITLE);
        assert!(events[0].is_all_day());
    }
}
