//! Calendar backend trait and the in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use econcal_core::BoxFuture;

use crate::entry::{EntryBody, EntryPage, ExistingEntry};
use crate::error::{CalendarError, CalendarResult};

/// The operations the reconciler needs from a calendar service.
pub trait CalendarBackend: Send + Sync {
    /// Short name used in logs (e.g. "google").
    fn name(&self) -> &str;

    /// Lists one page of entries starting within `[time_min, time_max]`,
    /// with recurring series expanded into single instances.
    fn list_page<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, CalendarResult<EntryPage>>;

    /// Creates an entry and returns its backend id.
    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<String>>;

    /// Replaces the entry `entry_id` with `body`.
    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        entry_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<()>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    calendars: BTreeMap<String, BTreeMap<String, EntryBody>>,
    inserts: usize,
    updates: usize,
    list_calls: usize,
}

/// An in-memory calendar.
///
/// Listings are paged with `page_size` entries per page, in entry id order.
/// Writes whose body carries a private metadata value registered with
/// [`MemoryCalendar::fail_writes_for`] fail with a server error.
#[derive(Debug)]
pub struct MemoryCalendar {
    page_size: usize,
    failing: HashSet<String>,
    state: Mutex<MemoryState>,
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new(250)
    }
}

impl MemoryCalendar {
    /// Creates an empty calendar; a page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            failing: HashSet::new(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Builder method to make writes of a given metadata value fail.
    pub fn fail_writes_for(mut self, metadata_value: impl Into<String>) -> Self {
        self.failing.insert(metadata_value.into());
        self
    }

    /// Stores an entry directly, bypassing failure injection.
    pub fn seed(&self, calendar_id: &str, body: EntryBody) -> String {
        let mut state = self.lock();
        let id = next_id(&mut state);
        state
            .calendars
            .entry(calendar_id.to_string())
            .or_default()
            .insert(id.clone(), body);
        id
    }

    /// Snapshot of a calendar's entries in id order.
    pub fn entries(&self, calendar_id: &str) -> Vec<(String, EntryBody)> {
        self.lock()
            .calendars
            .get(calendar_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, body)| (id.clone(), body.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of successful inserts so far.
    pub fn insert_count(&self) -> usize {
        self.lock().inserts
    }

    /// Number of successful updates so far.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    /// Number of `list_page` calls so far.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_failure(&self, body: &EntryBody) -> CalendarResult<()> {
        let failing = body
            .extended_properties
            .private
            .values()
            .any(|value| self.failing.contains(value));
        if failing {
            return Err(CalendarError::Server {
                status: 500,
                body: format!("injected failure for '{}'", body.summary),
            });
        }
        Ok(())
    }

    fn page(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> CalendarResult<EntryPage> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| CalendarError::InvalidResponse(format!("bad page token {}", token)))?,
            None => 0,
        };

        let mut state = self.lock();
        state.list_calls += 1;

        let matching: Vec<ExistingEntry> = state
            .calendars
            .get(calendar_id)
            .into_iter()
            .flat_map(|entries| entries.iter())
            .filter(|(_, body)| {
                let start = body.start.to_utc();
                start >= time_min && start <= time_max
            })
            .map(|(id, body)| ExistingEntry {
                id: id.clone(),
                extended_properties: Some(body.extended_properties.clone()),
            })
            .collect();

        let end = (offset + self.page_size).min(matching.len());
        let entries = matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(EntryPage {
            entries,
            next_page_token,
        })
    }
}

fn next_id(state: &mut MemoryState) -> String {
    state.next_id += 1;
    format!("mem{:06}", state.next_id)
}

impl CalendarBackend for MemoryCalendar {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_page<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, CalendarResult<EntryPage>> {
        let result = self.page(calendar_id, time_min, time_max, page_token);
        Box::pin(async move { result })
    }

    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<String>> {
        Box::pin(async move {
            self.check_failure(body)?;
            let mut state = self.lock();
            let id = next_id(&mut state);
            state
                .calendars
                .entry(calendar_id.to_string())
                .or_default()
                .insert(id.clone(), body.clone());
            state.inserts += 1;
            Ok(id)
        })
    }

    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        entry_id: &'a str,
        body: &'a EntryBody,
    ) -> BoxFuture<'a, CalendarResult<()>> {
        Box::pin(async move {
            self.check_failure(body)?;
            let mut state = self.lock();
            let slot = state
                .calendars
                .get_mut(calendar_id)
                .and_then(|entries| entries.get_mut(entry_id))
                .ok_or_else(|| CalendarError::NotFound(format!("entry {}", entry_id)))?;
            *slot = body.clone();
            state.updates += 1;
            Ok(())
        })
    }
}
