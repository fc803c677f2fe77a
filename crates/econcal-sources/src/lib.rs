//! Economic calendar sources.
//!
//! This crate turns upstream calendar feeds into canonical events:
//!
//! - [`RecordFeed`] - transports returning loosely-typed [`RawRecord`]s
//! - [`normalize_records`] - dedup, locale, importance and date filters
//! - [`EventSource`] - named fetchers (ForexFactory, FMP)
//! - [`SourceRegistry`] - name to fetcher lookup
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ ┌──────────────┐     ┌──────────────┐
//! │ ff this week │ │ ff next week │     │ FMP calendar │
//! └──────┬───────┘ └──────┬───────┘     └──────┬───────┘
//!        │   RecordFeed   │                    │
//!        ▼                ▼                    ▼
//! ┌───────────────────────────────┐   ┌────────────────┐
//! │      ForexFactorySource       │   │   FmpSource    │
//! └───────────────┬───────────────┘   └───────┬────────┘
//!                 │  normalize_records()      │
//!                 └───────────┬───────────────┘
//!                             ▼
//!                     ┌───────────────┐
//!                     │ EconomicEvent │
//!                     └───────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use econcal_sources::{FetchRequest, SourceContext, SourceRegistry};
//!
//! let registry = SourceRegistry::builtin(SourceContext::default());
//! let source = registry.get("forexfactory")?;
//! let events = source.fetch(&request).await;
//! ```

pub mod datetime;
pub mod error;
pub mod feed;
pub mod fmp;
pub mod forexfactory;
pub mod normalize;
pub mod raw_record;
pub mod registry;
pub mod source;

pub use datetime::parse_event_time;
pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use feed::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, JsonFeed, StaticFeed};
pub use fmp::FmpSource;
pub use forexfactory::ForexFactorySource;
pub use normalize::{FetchRequest, PipelineStats, RecordTranslator, composite_key, normalize_records};
pub use raw_record::{RawRecord, records_from_str, records_from_value};
pub use registry::{DEFAULT_SOURCE, SourceContext, SourceRegistry};
pub use source::{BoxFuture, EventSource, RecordFeed};
