//! Pull-based reconciliation of remote calendar state into the local store.
//!
//! Every remote record is authoritative during an explicit sync: missing local
//! records are created, differing ones replaced wholesale. One bad record is
//! recorded and skipped; it never blocks the rest of the pass.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use log::{info, warn};
use meeting_engine::{CalendarEvent, EventSource};
use serde::Serialize;

use crate::error::{RemoteError, ServiceError};
use crate::remote::RemoteCalendarClient;
use crate::store::EventStore;

/// Final state of one remote record after comparison with local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncError {
    /// `None` when the failure concerns the whole pass (e.g. listing).
    pub event_id: Option<String>,
    pub message: String,
    /// Whether retrying later may succeed.
    pub transient: bool,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub created_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
    /// Always 0: deletions are not reconciled by a pull.
    pub deleted_count: usize,
    pub errors: Vec<SyncError>,
    pub timestamp: DateTime<Utc>,
}

impl SyncResult {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            created_count: 0,
            updated_count: 0,
            unchanged_count: 0,
            deleted_count: 0,
            errors: Vec::new(),
            timestamp,
        }
    }

    fn record(&mut self, state: SyncState) {
        match state {
            SyncState::Created => self.created_count += 1,
            SyncState::Updated => self.updated_count += 1,
            SyncState::Unchanged => self.unchanged_count += 1,
        }
    }

    fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

pub struct SyncReconciler {
    store: Arc<dyn EventStore>,
    remote: Arc<dyn RemoteCalendarClient>,
}

impl SyncReconciler {
    pub fn new(store: Arc<dyn EventStore>, remote: Arc<dyn RemoteCalendarClient>) -> Self {
        Self { store, remote }
    }

    /// Pull `calendar_id` for `[start, end)` from the provider and merge it
    /// into the local store.
    pub async fn sync_calendar(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SyncResult {
        let provider = self.remote.provider_id().to_string();
        let mut result = SyncResult::new(Utc::now());
        info!(
            "event=sync_pass module=sync status=start provider={} calendar_id={}",
            provider, calendar_id
        );

        let remote_events = match self.remote.list_events(calendar_id, start, end).await {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    "event=sync_pass module=sync status=error provider={} calendar_id={} error={}",
                    provider, calendar_id, err
                );
                result.errors.push(remote_error(None, &err));
                return result.finish();
            }
        };

        for remote_event in remote_events {
            let event = self.normalize(remote_event, calendar_id);
            match self.reconcile_event(&event).await {
                Ok(state) => result.record(state),
                Err(err) => {
                    warn!(
                        "event=sync_event module=sync status=error event_id={} error={}",
                        event.id, err
                    );
                    result.errors.push(SyncError {
                        event_id: Some(event.id.clone()),
                        message: err.to_string(),
                        transient: false,
                    });
                }
            }
        }

        let result = result.finish();
        info!(
            "event=sync_pass module=sync status={} provider={} calendar_id={} created={} updated={} unchanged={} errors={}",
            if result.success { "ok" } else { "partial" },
            provider,
            calendar_id,
            result.created_count,
            result.updated_count,
            result.unchanged_count,
            result.errors.len()
        );
        result
    }

    /// Compare one remote record with local state and apply it.
    pub async fn reconcile_event(&self, remote: &CalendarEvent) -> Result<SyncState, ServiceError> {
        remote.validate()?;
        match self.store.get_event(&remote.id).await? {
            None => {
                self.store.upsert_event(remote).await?;
                Ok(SyncState::Created)
            }
            Some(local) if local.same_content(remote) => Ok(SyncState::Unchanged),
            Some(_) => {
                self.store.upsert_event(remote).await?;
                Ok(SyncState::Updated)
            }
        }
    }

    fn normalize(&self, mut event: CalendarEvent, calendar_id: &str) -> CalendarEvent {
        if event.calendar_id.trim().is_empty() {
            event.calendar_id = calendar_id.to_string();
        }
        event.source = EventSource::remote(self.remote.provider_id());
        // The store keeps milliseconds; finer remote times would never compare equal.
        event.start = event.start.trunc_subsecs(3);
        event.end = event.end.trunc_subsecs(3);
        event
    }
}

fn remote_error(event_id: Option<String>, err: &RemoteError) -> SyncError {
    SyncError {
        event_id,
        message: err.to_string(),
        transient: err.is_unreachable(),
    }
}
