//! Calendar side of the sync.
//!
//! - [`PresentationConfig`] - renders an [`EconomicEvent`](econcal_core::EconomicEvent)
//!   as an [`EntryBody`]
//! - [`CalendarBackend`] - list / insert / update against a calendar service
//! - [`ExistingIndex`] and [`Reconciler`] - create-or-update keyed by the
//!   event id stored in private metadata
//!
//! Backends: [`MemoryCalendar`] and, with the `google` feature,
//! [`google::GoogleCalendarClient`].

pub mod backend;
pub mod entry;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod presentation;
pub mod reconcile;

pub use backend::{CalendarBackend, MemoryCalendar};
pub use entry::{EntryBody, EntryPage, EntryTime, ExistingEntry, ExtendedProperties, Reminders};
pub use error::{CalendarError, CalendarResult};
pub use presentation::PresentationConfig;
pub use reconcile::{ExistingIndex, Reconciler, SyncReport, UpsertAction};
