//! Shared fixtures for meeting-sync integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use meeting_engine::{CalendarEvent, TimeSlot};
use meeting_sync::{
    AvailabilityProvider, EventStore, FetchError, RemoteCalendarClient, RemoteError,
    SqliteEventStore,
};

pub fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

pub fn event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent::new(id, format!("Event {id}"), "work", start, end)
}

pub fn memory_store() -> Arc<dyn EventStore> {
    Arc::new(SqliteEventStore::open_in_memory().unwrap())
}

/// In-memory stand-in for a calendar provider.
#[derive(Default)]
pub struct MockRemote {
    pub calendars: Mutex<HashMap<String, Vec<CalendarEvent>>>,
    pub write_error: Mutex<Option<RemoteError>>,
    pub list_error: Mutex<Option<RemoteError>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.calendars
            .lock()
            .unwrap()
            .insert(calendar_id.to_string(), events);
        self
    }

    pub fn failing_writes(self, error: RemoteError) -> Self {
        *self.write_error.lock().unwrap() = Some(error);
        self
    }

    pub fn failing_lists(self, error: RemoteError) -> Self {
        *self.list_error.lock().unwrap() = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn write(&self, call: String) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        match self.write_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteCalendarClient for MockRemote {
    fn provider_id(&self) -> &str {
        "mock"
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, RemoteError> {
        self.calls.lock().unwrap().push(format!("list:{calendar_id}"));
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self
            .calendars
            .lock()
            .unwrap()
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.start < end && e.end > start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<(), RemoteError> {
        self.write(format!("create:{}", event.id))
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), RemoteError> {
        self.write(format!("update:{}", event.id))
    }

    async fn delete_event(&self, _calendar_id: &str, event_id: &str) -> Result<(), RemoteError> {
        self.write(format!("delete:{event_id}"))
    }
}

/// Serves fixed intervals after an optional delay; some attendees fail.
#[derive(Default)]
pub struct ScriptedProvider {
    pub intervals: HashMap<String, Vec<TimeSlot>>,
    pub failing: Vec<String>,
    pub slow: Vec<String>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityProvider for ScriptedProvider {
    async fn availability(
        &self,
        attendee: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.iter().any(|a| a == attendee) {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.iter().any(|a| a == attendee) {
            return Err(RemoteError::Unreachable("connection refused".to_string()).into());
        }
        Ok(self.intervals.get(attendee).cloned().unwrap_or_default())
    }
}
