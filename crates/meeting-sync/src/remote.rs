//! Contract for one external calendar provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meeting_engine::CalendarEvent;

use crate::error::RemoteError;

#[async_trait]
pub trait RemoteCalendarClient: Send + Sync {
    /// Provider tag stored in `EventSource::Remote`, e.g. `"google"`.
    fn provider_id(&self) -> &str;

    /// Events of `calendar_id` overlapping `[start, end)`. For people outside
    /// the local store the calendar id is their email address.
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, RemoteError>;

    async fn create_event(&self, event: &CalendarEvent) -> Result<(), RemoteError>;

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), RemoteError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), RemoteError>;
}
