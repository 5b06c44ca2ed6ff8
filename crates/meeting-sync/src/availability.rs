//! Sources of per-attendee availability intervals.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meeting_engine::interval::Interval;
use meeting_engine::{availability_from_events, AvailabilityMap, TimeSlot};

use crate::error::FetchError;
use crate::remote::RemoteCalendarClient;
use crate::store::{EventStore, RangeQuery};

#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Intervals describing `attendee` within `[start, end)`.
    async fn availability(
        &self,
        attendee: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError>;
}

/// Availability of a local user, derived from the events in the local store.
///
/// Events without attendees belong to the store owner; events with attendees
/// count when the user attends without having declined.
pub struct StoreAvailability {
    store: Arc<dyn EventStore>,
}

impl StoreAvailability {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AvailabilityProvider for StoreAvailability {
    async fn availability(
        &self,
        attendee: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError> {
        let events = self
            .store
            .events_in_range(&RangeQuery::new(start, end))
            .await?;
        let own: Vec<_> = events
            .into_iter()
            .filter(|e| e.attendees.is_empty() || e.has_participant(attendee))
            .collect();
        Ok(availability_from_events(&own, start, end))
    }
}

/// Availability of anyone else, derived from their calendar at the provider.
pub struct RemoteAvailability {
    client: Arc<dyn RemoteCalendarClient>,
}

impl RemoteAvailability {
    pub fn new(client: Arc<dyn RemoteCalendarClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AvailabilityProvider for RemoteAvailability {
    async fn availability(
        &self,
        attendee: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError> {
        let events = self.client.list_events(attendee, start, end).await?;
        Ok(availability_from_events(&events, start, end))
    }
}

/// Sends local users to one provider and everybody else to another.
pub struct RoutedAvailability {
    local_users: HashSet<String>,
    local: Arc<dyn AvailabilityProvider>,
    remote: Arc<dyn AvailabilityProvider>,
}

impl RoutedAvailability {
    pub fn new(
        local_users: impl IntoIterator<Item = String>,
        local: Arc<dyn AvailabilityProvider>,
        remote: Arc<dyn AvailabilityProvider>,
    ) -> Self {
        Self {
            local_users: local_users
                .into_iter()
                .map(|user| user.to_lowercase())
                .collect(),
            local,
            remote,
        }
    }

    pub fn is_local(&self, attendee: &str) -> bool {
        self.local_users.contains(&attendee.to_lowercase())
    }
}

#[async_trait]
impl AvailabilityProvider for RoutedAvailability {
    async fn availability(
        &self,
        attendee: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError> {
        if self.is_local(attendee) {
            self.local.availability(attendee, start, end).await
        } else {
            self.remote.availability(attendee, start, end).await
        }
    }
}

/// Pre-computed intervals, e.g. loaded from a request file.
#[derive(Debug, Clone, Default)]
pub struct StaticAvailability {
    intervals: AvailabilityMap,
}

impl StaticAvailability {
    pub fn new(intervals: AvailabilityMap) -> Self {
        Self { intervals }
    }
}

#[async_trait]
impl AvailabilityProvider for StaticAvailability {
    async fn availability(
        &self,
        attendee: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, FetchError> {
        Ok(self
            .intervals
            .get(attendee)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|slot| slot.overlaps(start, end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
