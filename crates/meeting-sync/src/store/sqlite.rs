//! SQLite-backed [`EventStore`].
//!
//! One connection behind a mutex; every call runs on the blocking pool so
//! async callers never stall on disk I/O. Instants are stored as Unix
//! milliseconds, so sub-millisecond precision is dropped on write.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use meeting_engine::{
    Attachment, Attendee, AttendeeStatus, Calendar, CalendarEvent, EventSource, EventStatus,
    Metadata, RecurrenceRule, Reminder, ReminderMethod, Visibility,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

use super::migrations::apply_migrations;
use super::{EventStore, RangeQuery};
use crate::error::{StoreError, StoreResult};

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    calendar_id,
    title,
    description,
    location,
    start_ms,
    end_ms,
    is_all_day,
    recurrence,
    visibility,
    status,
    source,
    last_modified_ms,
    metadata
FROM events";

const CALENDAR_SELECT_SQL: &str = "SELECT
    id,
    name,
    color,
    is_visible,
    sync_enabled,
    source,
    timezone,
    can_write
FROM calendars";

/// Shareable handle to one SQLite database. Clones refer to the same
/// connection and change feed.
#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
    changes: Arc<watch::Sender<u64>>,
}

impl std::fmt::Debug for SqliteEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventStore")
            .field("version", &*self.changes.borrow())
            .finish_non_exhaustive()
    }
}

impl SqliteEventStore {
    /// Opens (creating if needed) a database file and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::bootstrap("file", || Connection::open(path))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap("memory", Connection::open_in_memory)
    }

    fn bootstrap(
        mode: &str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=store status=start mode={}", mode);

        let result = connect().map_err(StoreError::from).and_then(|mut conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

        match result {
            Ok(conn) => {
                info!(
                    "event=db_open module=store status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                let (changes, _) = watch::channel(0);
                Ok(Self {
                    conn: Arc::new(Mutex::new(conn)),
                    changes: Arc::new(changes),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=store status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            op(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn events_in_range(&self, query: &RangeQuery) -> StoreResult<Vec<CalendarEvent>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{EVENT_SELECT_SQL}
                 WHERE start_ms < ?2
                   AND (end_ms > ?1 OR (end_ms = start_ms AND start_ms >= ?1))
                   AND (?3 IS NULL OR calendar_id = ?3)
                 ORDER BY start_ms, end_ms, id;"
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        query.start.timestamp_millis(),
                        query.end.timestamp_millis(),
                        query.calendar_id
                    ],
                    EventRow::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);
            rows.into_iter().map(|row| row.load(conn)).collect()
        })
        .await
    }

    async fn get_event(&self, id: &str) -> StoreResult<Option<CalendarEvent>> {
        let id = id.to_string();
        self.with_conn(move |conn| load_event(conn, &id)).await
    }

    async fn upsert_event(&self, event: &CalendarEvent) -> StoreResult<CalendarEvent> {
        event.validate()?;
        let event = event.clone();
        let id = event.id.clone();
        let stored = self
            .with_conn(move |conn| replace_event(conn, &event, false))
            .await?
            .ok_or_else(|| StoreError::InvalidData(format!("event {} vanished during upsert", id)))?;

        debug!(
            "event=event_upsert module=store status=ok event_id={} calendar_id={}",
            stored.id, stored.calendar_id
        );
        self.notify();
        Ok(stored)
    }

    async fn update_event(&self, event: &CalendarEvent) -> StoreResult<Option<CalendarEvent>> {
        event.validate()?;
        let event = event.clone();
        let stored = self
            .with_conn(move |conn| replace_event(conn, &event, true))
            .await?;

        if let Some(stored) = &stored {
            debug!(
                "event=event_update module=store status=ok event_id={} calendar_id={}",
                stored.id, stored.calendar_id
            );
            self.notify();
        }
        Ok(stored)
    }

    async fn delete_event(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        let deleted = self
            .with_conn(move |conn| {
                let changed = conn.execute("DELETE FROM events WHERE id = ?1;", params![id])?;
                Ok(changed > 0)
            })
            .await?;
        if deleted {
            self.notify();
        }
        Ok(deleted)
    }

    async fn conflicts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> StoreResult<Vec<CalendarEvent>> {
        let candidates = self
            .events_in_range(&RangeQuery::new(start, end))
            .await?;
        let blocking: Vec<CalendarEvent> =
            candidates.into_iter().filter(|e| e.is_blocking()).collect();
        Ok(meeting_engine::conflicts(start, end, &blocking, exclude_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn upsert_calendar(&self, calendar: &Calendar) -> StoreResult<()> {
        calendar.validate()?;
        let calendar = calendar.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO calendars (
                    id, name, color, is_visible, sync_enabled, source, timezone, can_write
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    color = excluded.color,
                    is_visible = excluded.is_visible,
                    sync_enabled = excluded.sync_enabled,
                    source = excluded.source,
                    timezone = excluded.timezone,
                    can_write = excluded.can_write;",
                params![
                    calendar.id,
                    calendar.name,
                    calendar.color,
                    calendar.is_visible,
                    calendar.sync_enabled,
                    calendar.source.to_string(),
                    calendar.timezone,
                    calendar.can_write,
                ],
            )?;
            Ok(())
        })
        .await?;
        self.notify();
        Ok(())
    }

    async fn get_calendar(&self, id: &str) -> StoreResult<Option<Calendar>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("{CALENDAR_SELECT_SQL} WHERE id = ?1;"),
                    params![id],
                    CalendarRow::from_row,
                )
                .optional()?;
            row.map(CalendarRow::into_calendar).transpose()
        })
        .await
    }

    async fn list_calendars(&self) -> StoreResult<Vec<Calendar>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CALENDAR_SELECT_SQL} ORDER BY id;"))?;
            let rows = stmt
                .query_map([], CalendarRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(CalendarRow::into_calendar).collect()
        })
        .await
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Writes `event` and its children in one transaction, stamping
/// `last_modified` from the row it replaces. With `require_existing`, an
/// unknown id writes nothing and yields `None`.
fn replace_event(
    conn: &mut Connection,
    event: &CalendarEvent,
    require_existing: bool,
) -> StoreResult<Option<CalendarEvent>> {
    let tx = conn.transaction()?;
    let previous: Option<i64> = tx
        .query_row(
            "SELECT last_modified_ms FROM events WHERE id = ?1;",
            params![event.id],
            |row| row.get(0),
        )
        .optional()?;
    if require_existing && previous.is_none() {
        return Ok(None);
    }
    let last_modified = Utc::now()
        .timestamp_millis()
        .max(previous.unwrap_or(i64::MIN));

    write_event(&tx, event, last_modified)?;
    let stored = load_event(&tx, &event.id)?;
    tx.commit()?;
    Ok(stored)
}

fn write_event(conn: &Connection, event: &CalendarEvent, last_modified_ms: i64) -> StoreResult<()> {
    let metadata = event
        .metadata
        .to_blob()
        .map_err(|e| StoreError::InvalidData(format!("metadata for {}: {}", event.id, e)))?;

    conn.execute(
        "INSERT INTO events (
            id, calendar_id, title, description, location, start_ms, end_ms, is_all_day,
            recurrence, visibility, status, source, last_modified_ms, metadata
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT (id) DO UPDATE SET
            calendar_id = excluded.calendar_id,
            title = excluded.title,
            description = excluded.description,
            location = excluded.location,
            start_ms = excluded.start_ms,
            end_ms = excluded.end_ms,
            is_all_day = excluded.is_all_day,
            recurrence = excluded.recurrence,
            visibility = excluded.visibility,
            status = excluded.status,
            source = excluded.source,
            last_modified_ms = excluded.last_modified_ms,
            metadata = excluded.metadata;",
        params![
            event.id,
            event.calendar_id,
            event.title,
            event.description,
            event.location,
            event.start.timestamp_millis(),
            event.end.timestamp_millis(),
            event.is_all_day,
            event.recurrence.as_ref().map(RecurrenceRule::as_str),
            event.visibility.as_str(),
            event.status.as_str(),
            event.source.to_string(),
            last_modified_ms,
            metadata,
        ],
    )?;

    // Children are replaced wholesale, never diffed.
    for table in ["event_attendees", "event_reminders", "event_attachments"] {
        conn.execute(
            &format!("DELETE FROM {table} WHERE event_id = ?1;"),
            params![event.id],
        )?;
    }

    for (position, attendee) in event.attendees.iter().enumerate() {
        conn.execute(
            "INSERT INTO event_attendees (
                event_id, position, email, display_name, status, is_organizer, is_optional
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                event.id,
                position as i64,
                attendee.email,
                attendee.display_name,
                attendee.status.as_str(),
                attendee.is_organizer,
                attendee.is_optional,
            ],
        )?;
    }
    for (position, reminder) in event.reminders.iter().enumerate() {
        conn.execute(
            "INSERT INTO event_reminders (event_id, position, minutes_before, method)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                event.id,
                position as i64,
                reminder.minutes_before,
                reminder.method.as_str(),
            ],
        )?;
    }
    for (position, attachment) in event.attachments.iter().enumerate() {
        conn.execute(
            "INSERT INTO event_attachments (event_id, position, name, uri, mime_type)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                event.id,
                position as i64,
                attachment.name,
                attachment.uri,
                attachment.mime_type,
            ],
        )?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

fn load_event(conn: &Connection, id: &str) -> StoreResult<Option<CalendarEvent>> {
    let row = conn
        .query_row(
            &format!("{EVENT_SELECT_SQL} WHERE id = ?1;"),
            params![id],
            EventRow::from_row,
        )
        .optional()?;
    row.map(|row| row.load(conn)).transpose()
}

/// Raw column values of one `events` row, decoded outside the rusqlite
/// row callback so malformed data surfaces as `StoreError::InvalidData`.
struct EventRow {
    id: String,
    calendar_id: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_ms: i64,
    end_ms: i64,
    is_all_day: bool,
    recurrence: Option<String>,
    visibility: String,
    status: String,
    source: String,
    last_modified_ms: i64,
    metadata: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            calendar_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            location: row.get(4)?,
            start_ms: row.get(5)?,
            end_ms: row.get(6)?,
            is_all_day: row.get(7)?,
            recurrence: row.get(8)?,
            visibility: row.get(9)?,
            status: row.get(10)?,
            source: row.get(11)?,
            last_modified_ms: row.get(12)?,
            metadata: row.get(13)?,
        })
    }

    fn load(self, conn: &Connection) -> StoreResult<CalendarEvent> {
        let attendees = load_attendees(conn, &self.id)?;
        let reminders = load_reminders(conn, &self.id)?;
        let attachments = load_attachments(conn, &self.id)?;
        let metadata = Metadata::from_blob(&self.metadata)
            .map_err(|e| StoreError::InvalidData(format!("metadata for {}: {}", self.id, e)))?;

        Ok(CalendarEvent {
            start: instant(self.start_ms, "start_ms")?,
            end: instant(self.end_ms, "end_ms")?,
            last_modified: instant(self.last_modified_ms, "last_modified_ms")?,
            is_all_day: self.is_all_day,
            recurrence: self.recurrence.map(RecurrenceRule::parse).transpose()?,
            visibility: decode::<Visibility>(&self.visibility)?,
            status: decode::<EventStatus>(&self.status)?,
            source: decode::<EventSource>(&self.source)?,
            attendees,
            reminders,
            attachments,
            metadata,
            id: self.id,
            calendar_id: self.calendar_id,
            title: self.title,
            description: self.description,
            location: self.location,
        })
    }
}

fn load_attendees(conn: &Connection, event_id: &str) -> StoreResult<Vec<Attendee>> {
    let mut stmt = conn.prepare(
        "SELECT email, display_name, status, is_organizer, is_optional
         FROM event_attendees WHERE event_id = ?1 ORDER BY position;",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(email, display_name, status, is_organizer, is_optional)| {
            Ok(Attendee {
                email,
                display_name,
                status: decode::<AttendeeStatus>(&status)?,
                is_organizer,
                is_optional,
            })
        })
        .collect()
}

fn load_reminders(conn: &Connection, event_id: &str) -> StoreResult<Vec<Reminder>> {
    let mut stmt = conn.prepare(
        "SELECT minutes_before, method
         FROM event_reminders WHERE event_id = ?1 ORDER BY position;",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(minutes_before, method)| {
            Ok(Reminder {
                minutes_before,
                method: decode::<ReminderMethod>(&method)?,
            })
        })
        .collect()
}

fn load_attachments(conn: &Connection, event_id: &str) -> StoreResult<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT name, uri, mime_type
         FROM event_attachments WHERE event_id = ?1 ORDER BY position;",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(Attachment {
                name: row.get(0)?,
                uri: row.get(1)?,
                mime_type: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

struct CalendarRow {
    id: String,
    name: String,
    color: String,
    is_visible: bool,
    sync_enabled: bool,
    source: String,
    timezone: String,
    can_write: bool,
}

impl CalendarRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            is_visible: row.get(3)?,
            sync_enabled: row.get(4)?,
            source: row.get(5)?,
            timezone: row.get(6)?,
            can_write: row.get(7)?,
        })
    }

    fn into_calendar(self) -> StoreResult<Calendar> {
        Ok(Calendar {
            source: decode::<EventSource>(&self.source)?,
            id: self.id,
            name: self.name,
            color: self.color,
            is_visible: self.is_visible,
            sync_enabled: self.sync_enabled,
            timezone: self.timezone,
            can_write: self.can_write,
        })
    }
}

fn instant(ms: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("{column} out of range: {ms}")))
}

fn decode<T>(value: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::InvalidData(e.to_string()))
}
