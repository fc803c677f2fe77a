//! Create-or-update reconciliation against the target calendar.
//!
//! Each event's id is stored in the entry's private metadata. Before
//! writing, the existing entries in the sync window are indexed by that id;
//! an event whose id is already indexed is updated in place, any other
//! event is created.
//!
//! Entries whose event disappeared upstream are left alone.

use std::collections::HashMap;

use tracing::{debug, error, info};

use econcal_core::{DateRange, EconomicEvent};

use crate::backend::CalendarBackend;
use crate::error::CalendarResult;
use crate::presentation::PresentationConfig;

/// Event id to backend entry id, for entries already in the calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIndex {
    entries: HashMap<String, String>,
}

impl ExistingIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every entry in `range` carrying `metadata_key`, following
    /// continuation tokens until the listing is exhausted.
    ///
    /// # Errors
    ///
    /// Fails if any page cannot be listed.
    pub async fn load(
        backend: &dyn CalendarBackend,
        calendar_id: &str,
        range: &DateRange,
        metadata_key: &str,
    ) -> CalendarResult<Self> {
        let mut index = Self::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = backend
                .list_page(
                    calendar_id,
                    range.time_min(),
                    range.time_max(),
                    page_token.as_deref(),
                )
                .await?;
            pages += 1;

            for entry in &page.entries {
                if let Some(key) = entry.metadata(metadata_key) {
                    index.insert(key, &entry.id);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "indexed {} existing entries from {} pages of {}",
            index.len(),
            pages,
            calendar_id
        );
        Ok(index)
    }

    /// Returns the backend id for an event id.
    pub fn get(&self, event_id: &str) -> Option<&str> {
        self.entries.get(event_id).map(String::as_str)
    }

    /// Records that `event_id` lives in entry `entry_id`.
    pub fn insert(&mut self, event_id: impl Into<String>, entry_id: impl Into<String>) {
        self.entries.insert(event_id.into(), entry_id.into());
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// A new entry was inserted.
    Created,
    /// An existing entry was replaced.
    Updated,
}

/// Outcome counts of a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries inserted.
    pub created: usize,
    /// Entries replaced.
    pub updated: usize,
    /// Events whose write failed.
    pub failed: usize,
}

impl SyncReport {
    /// Total events processed.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.failed
    }

    fn record(&mut self, action: UpsertAction) {
        match action {
            UpsertAction::Created => self.created += 1,
            UpsertAction::Updated => self.updated += 1,
        }
    }
}

/// Applies events to one calendar.
pub struct Reconciler<'a> {
    backend: &'a dyn CalendarBackend,
    calendar_id: String,
    presentation: PresentationConfig,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler writing to `calendar_id` through `backend`.
    pub fn new(
        backend: &'a dyn CalendarBackend,
        calendar_id: impl Into<String>,
        presentation: PresentationConfig,
    ) -> Self {
        Self {
            backend,
            calendar_id: calendar_id.into(),
            presentation,
        }
    }

    /// Loads the index of entries this tool manages within `range`.
    ///
    /// # Errors
    ///
    /// Fails if the calendar cannot be listed.
    pub async fn load_index(&self, range: &DateRange) -> CalendarResult<ExistingIndex> {
        ExistingIndex::load(
            self.backend,
            &self.calendar_id,
            range,
            &self.presentation.metadata_key,
        )
        .await
    }

    /// Creates or updates the entry for one event.
    ///
    /// A newly created entry is added to `index`, so a repeated event id in
    /// the same run updates instead of duplicating.
    ///
    /// # Errors
    ///
    /// Returns the backend error of the failed write.
    pub async fn upsert(
        &self,
        event: &EconomicEvent,
        index: &mut ExistingIndex,
    ) -> CalendarResult<UpsertAction> {
        let body = self.presentation.build_entry(event);

        match index.get(&event.id) {
            Some(entry_id) => {
                self.backend
                    .update(&self.calendar_id, entry_id, &body)
                    .await?;
                info!("updated: {}", body.summary);
                Ok(UpsertAction::Updated)
            }
            None => {
                let entry_id = self.backend.insert(&self.calendar_id, &body).await?;
                info!("created: {}", body.summary);
                index.insert(event.id.clone(), entry_id);
                Ok(UpsertAction::Created)
            }
        }
    }

    /// Upserts every event in order.
    ///
    /// A failed write is logged and counted; the remaining events are still
    /// processed.
    pub async fn reconcile(&self, events: &[EconomicEvent], index: &mut ExistingIndex) -> SyncReport {
        let mut report = SyncReport::default();

        for event in events {
            match self.upsert(event, index).await {
                Ok(action) => report.record(action),
                Err(e) => {
                    error!("failed to write {} ({}): {}", event.name, event.id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
