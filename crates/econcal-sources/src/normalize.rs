//! Raw record to canonical event pipeline.
//!
//! Every fetcher funnels its upstream records through [`normalize_records`]:
//!
//! 1. Deduplicate by composite key, first occurrence wins
//! 2. Locale filter (the source's vocabulary mapped to canonical codes)
//! 3. Importance filter
//! 4. Date parse and date-range filter
//!
//! Each record stops at the first filter it fails. Record order is
//! preserved, so callers that merge several feeds must put the primary feed
//! first for its field values to win.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use econcal_core::{DateRange, EconomicEvent, EventTime, Importance};

use crate::datetime::parse_event_time;
use crate::raw_record::RawRecord;

/// Candidate field names for the event title.
pub const TITLE_KEYS: &[&str] = &["title", "event"];
/// Candidate field names for the raw date.
pub const DATE_KEYS: &[&str] = &["date"];
/// Candidate field names for the upstream locale.
pub const COUNTRY_KEYS: &[&str] = &["country"];
/// Candidate field names for an upstream-provided identifier.
pub const SOURCE_ID_KEYS: &[&str] = &["id", "event_id"];

/// What the caller wants back from a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Inclusive date window.
    pub range: DateRange,
    /// Accepted canonical locale codes (e.g. "USD").
    pub countries: BTreeSet<String>,
    /// Events below this level are dropped.
    pub importance_min: Importance,
}

impl FetchRequest {
    /// Creates a request; locale codes are upper-cased.
    pub fn new<I, S>(range: DateRange, countries: I, importance_min: Importance) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            range,
            countries: countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            importance_min,
        }
    }

    /// Returns true if `locale` is one of the requested codes.
    pub fn admits_locale(&self, locale: &str) -> bool {
        !locale.is_empty() && self.countries.contains(locale)
    }

    /// Returns true if `importance` meets the threshold.
    pub fn admits_importance(&self, importance: Importance) -> bool {
        importance >= self.importance_min
    }

    /// Returns true if the event's effective date is in range.
    pub fn admits_time(&self, time: &EventTime) -> bool {
        self.range.contains(time.date())
    }
}

/// Translation from one source's upstream vocabulary to canonical events.
///
/// Implementations own the static mapping tables for locale and impact.
/// Unmapped values map to an empty locale / [`Importance::HOLIDAY`], which the
/// request filters then exclude.
pub trait RecordTranslator {
    /// Prefix for synthetic ids (e.g. "fmp"); `None` uses the bare composite key.
    fn id_prefix(&self) -> Option<&str> {
        None
    }

    /// Canonical locale code of the record, or an empty string if unmapped.
    fn locale(&self, record: &RawRecord) -> String;

    /// Importance of the record on the 0-3 scale.
    fn importance(&self, record: &RawRecord) -> Importance;

    /// Builds the canonical event once the record passed every filter.
    fn translate(
        &self,
        record: &RawRecord,
        id: String,
        locale: String,
        importance: Importance,
        time: EventTime,
    ) -> EconomicEvent;
}

/// Counts of what the pipeline did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records received.
    pub input: usize,
    /// Dropped as duplicates of an earlier record.
    pub duplicates: usize,
    /// Dropped by the locale filter.
    pub wrong_locale: usize,
    /// Dropped by the importance filter.
    pub below_importance: usize,
    /// Dropped because the date could not be parsed.
    pub unparseable_date: usize,
    /// Dropped by the date-range filter.
    pub out_of_range: usize,
    /// Events returned.
    pub emitted: usize,
}

/// Builds the dedup key of a record: title, raw date, locale and upstream
/// id, trimmed, empty parts omitted, joined with `_`.
pub fn composite_key(record: &RawRecord) -> String {
    let parts = [
        record.text_or_empty(TITLE_KEYS),
        record.text_or_empty(DATE_KEYS),
        record.text_or_empty(COUNTRY_KEYS).to_uppercase(),
        record.text_or_empty(SOURCE_ID_KEYS),
    ];
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Removes records whose composite key was already seen, keeping the first.
pub fn dedup_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(composite_key(record)))
        .collect()
}

/// Runs the dedup and filter pipeline over `records`.
pub fn normalize_records<T>(
    translator: &T,
    records: Vec<RawRecord>,
    request: &FetchRequest,
) -> (Vec<EconomicEvent>, PipelineStats)
where
    T: RecordTranslator + ?Sized,
{
    let mut stats = PipelineStats {
        input: records.len(),
        ..Default::default()
    };

    let unique = dedup_records(records);
    stats.duplicates = stats.input - unique.len();

    let mut emitted_ids = HashSet::new();
    let mut events = Vec::new();

    for record in &unique {
        let locale = translator.locale(record);
        if !request.admits_locale(&locale) {
            stats.wrong_locale += 1;
            continue;
        }

        let importance = translator.importance(record);
        if !request.admits_importance(importance) {
            stats.below_importance += 1;
            continue;
        }

        let raw_date = record.text_or_empty(DATE_KEYS);
        let Some(time) = parse_event_time(&raw_date) else {
            debug!(
                "dropping record with unparseable date {:?}: {}",
                raw_date,
                record.text_or_empty(TITLE_KEYS)
            );
            stats.unparseable_date += 1;
            continue;
        };
        if !request.admits_time(&time) {
            stats.out_of_range += 1;
            continue;
        }

        let key = composite_key(record);
        let id = match translator.id_prefix() {
            Some(prefix) => format!("{}_{}", prefix, key),
            None => key,
        };
        if !emitted_ids.insert(id.clone()) {
            warn!("dropping event with duplicate id {}", id);
            stats.duplicates += 1;
            continue;
        }

        events.push(translator.translate(record, id, locale, importance, time));
    }

    stats.emitted = events.len();
    debug!(
        input = stats.input,
        duplicates = stats.duplicates,
        wrong_locale = stats.wrong_locale,
        below_importance = stats.below_importance,
        unparseable_date = stats.unparseable_date,
        out_of_range = stats.out_of_range,
        emitted = stats.emitted,
        "normalized upstream records"
    );

    (events, stats)
}
