//! Core types: canonical economic events, importance, date ranges, tracing

use std::future::Future;
use std::pin::Pin;

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{EconomicEvent, FALLBACK_TITLE, Importance, NOT_AVAILABLE};
pub use time::{DateRange, EventTime};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

/// A boxed future for async trait methods.
///
/// Keeps the fetcher and calendar traits object-safe so callers can hold
/// `Box<dyn ...>` values.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
