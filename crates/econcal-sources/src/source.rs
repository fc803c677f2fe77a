//! Fetcher traits.
//!
//! Two layers:
//! - [`RecordFeed`]: a transport that returns raw upstream records for a date
//!   range (HTTP JSON endpoint, replay file, test fixture)
//! - [`EventSource`]: a named fetcher that turns one or more feeds into
//!   canonical events for a [`FetchRequest`]
//!
//! Feeds report failures. Sources do not: an unavailable upstream degrades
//! to an empty result.

pub use econcal_core::BoxFuture;

use econcal_core::{DateRange, EconomicEvent};

use crate::error::SourceResult;
use crate::normalize::FetchRequest;
use crate::raw_record::RawRecord;

/// A transport returning raw upstream records.
pub trait RecordFeed: Send + Sync {
    /// Short name used in logs and errors (e.g. "ff-thisweek").
    fn name(&self) -> &str;

    /// Fetches every record the upstream publishes for `range`.
    ///
    /// Feeds with a fixed window (such as a "this week" export) may ignore
    /// the range; the pipeline filters by date anyway.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` on transport failures, non-success statuses or
    /// payloads that are not a JSON array.
    fn fetch_records<'a>(&'a self, range: &'a DateRange)
    -> BoxFuture<'a, SourceResult<Vec<RawRecord>>>;
}

/// A named economic calendar fetcher.
pub trait EventSource: Send + Sync {
    /// Registry name of this source (e.g. "forexfactory").
    fn name(&self) -> &str;

    /// Fetches canonical events matching `request`.
    ///
    /// Never fails: upstream errors are logged and yield fewer (or zero)
    /// events.
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, Vec<EconomicEvent>>;
}
