//! Local event persistence.
//!
//! # Responsibility
//! - Define the [`EventStore`] contract used by the service, reconciler and
//!   availability providers.
//! - Provide live range subscriptions on top of the store's change counter.
//!
//! # Invariants
//! - An event and its attendees, reminders and attachments are written in one
//!   transaction; readers never observe a half-written event.
//! - `last_modified` is assigned inside the write transaction and never moves
//!   backwards for a given id.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meeting_engine::{Calendar, CalendarEvent};
use tokio::sync::watch;

use crate::error::StoreResult;

pub mod migrations;
mod sqlite;

pub use sqlite::SqliteEventStore;

/// Events overlapping `[start, end)`, optionally limited to one calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calendar_id: Option<String>,
}

impl RangeQuery {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            calendar_id: None,
        }
    }

    pub fn in_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events overlapping the query range, ordered by start, end, then id.
    /// Zero-length events inside the range are included.
    async fn events_in_range(&self, query: &RangeQuery) -> StoreResult<Vec<CalendarEvent>>;

    async fn get_event(&self, id: &str) -> StoreResult<Option<CalendarEvent>>;

    /// Insert or fully replace an event and its children, returning the
    /// stored record with its new `last_modified`.
    async fn upsert_event(&self, event: &CalendarEvent) -> StoreResult<CalendarEvent>;

    /// Replace an event only if its id is already stored, deciding inside the
    /// write transaction. Returns `None` and writes nothing otherwise.
    async fn update_event(&self, event: &CalendarEvent) -> StoreResult<Option<CalendarEvent>>;

    /// Returns whether a row was deleted.
    async fn delete_event(&self, id: &str) -> StoreResult<bool>;

    /// Non-cancelled events overlapping `[start, end)` other than `exclude_id`.
    async fn conflicts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> StoreResult<Vec<CalendarEvent>>;

    async fn upsert_calendar(&self, calendar: &Calendar) -> StoreResult<()>;

    async fn get_calendar(&self, id: &str) -> StoreResult<Option<Calendar>>;

    async fn list_calendars(&self) -> StoreResult<Vec<Calendar>>;

    /// Counter bumped after every committed change.
    fn changes(&self) -> watch::Receiver<u64>;
}

/// A range query that stays current: the snapshot taken at subscription time
/// plus a fresh snapshot after each committed change.
pub struct EventSubscription {
    store: Arc<dyn EventStore>,
    query: RangeQuery,
    changes: watch::Receiver<u64>,
    snapshot: Vec<CalendarEvent>,
}

impl EventSubscription {
    pub async fn open(store: Arc<dyn EventStore>, query: RangeQuery) -> StoreResult<Self> {
        let mut changes = store.changes();
        // Mark the current version seen before reading, so a write racing the
        // first query still triggers a refresh.
        changes.borrow_and_update();
        let snapshot = store.events_in_range(&query).await?;
        Ok(Self {
            store,
            query,
            changes,
            snapshot,
        })
    }

    pub fn query(&self) -> &RangeQuery {
        &self.query
    }

    pub fn snapshot(&self) -> &[CalendarEvent] {
        &self.snapshot
    }

    /// Waits for the next committed change and re-runs the query.
    ///
    /// Returns `Ok(None)` if the change feed has closed.
    pub async fn next_snapshot(&mut self) -> StoreResult<Option<&[CalendarEvent]>> {
        if self.changes.changed().await.is_err() {
            return Ok(None);
        }
        self.changes.borrow_and_update();
        self.snapshot = self.store.events_in_range(&self.query).await?;
        Ok(Some(&self.snapshot))
    }

    /// Stops listening for changes.
    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("query", &self.query)
            .field("snapshot_len", &self.snapshot.len())
            .finish()
    }
}
