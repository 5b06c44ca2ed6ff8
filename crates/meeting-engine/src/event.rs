//! Calendar events and the child records they own.
//!
//! An event is always replaced wholesale: its attendees, reminders and
//! attachments travel with it and are never shared between events.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rrule::{RRule, Unvalidated};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::interval::Interval;
use crate::metadata::Metadata;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("valid email regex")
});

/// Metadata flag marking an event as out-of-office time.
pub const OUT_OF_OFFICE_KEY: &str = "out_of_office";

/// Checks an email address has the `local@domain.tld` shape.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

fn unknown(kind: &'static str, value: &str) -> ValidationError {
    ValidationError::UnknownValue {
        kind,
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Tentative,
    Delegated,
}

impl AttendeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::Delegated => "delegated",
        }
    }
}

impl FromStr for AttendeeStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "tentative" => Ok(Self::Tentative),
            "delegated" => Ok(Self::Delegated),
            other => Err(unknown("attendee status", other)),
        }
    }
}

/// A participant of exactly one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: AttendeeStatus,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub is_optional: bool,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            status: AttendeeStatus::default(),
            is_organizer: false,
            is_optional: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMethod {
    #[default]
    Notification,
    Email,
}

impl ReminderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Email => "email",
        }
    }
}

impl FromStr for ReminderMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "notification" => Ok(Self::Notification),
            "email" => Ok(Self::Email),
            other => Err(unknown("reminder method", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub minutes_before: u32,
    #[serde(default)]
    pub method: ReminderMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Default,
    Public,
    Private,
    Confidential,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Public => "public",
            Self::Private => "private",
            Self::Confidential => "confidential",
        }
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "confidential" => Ok(Self::Confidential),
            other => Err(unknown("visibility", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Tentative => "tentative",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "confirmed" => Ok(Self::Confirmed),
            "tentative" => Ok(Self::Tentative),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(unknown("event status", other)),
        }
    }
}

/// Where an event (or calendar) originates: this device, or a named remote
/// provider such as `"google"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventSource {
    #[default]
    Local,
    Remote(String),
}

impl EventSource {
    pub fn remote(provider: impl Into<String>) -> Self {
        Self::Remote(provider.into())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote(provider) => f.write_str(provider),
        }
    }
}

impl FromStr for EventSource {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" => Err(unknown("event source", value)),
            "local" => Ok(Self::Local),
            provider => Ok(Self::Remote(provider.to_string())),
        }
    }
}

impl From<EventSource> for String {
    fn from(value: EventSource) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EventSource {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An RFC 5545 RRULE body carried opaquely on an event. It is checked for
/// syntax but never expanded into occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurrenceRule(String);

impl RecurrenceRule {
    /// Parses `FREQ=...` (an optional `RRULE:` prefix is accepted).
    pub fn parse(rule: impl Into<String>) -> Result<Self, ValidationError> {
        let rule = Self(rule.into());
        rule.validate()?;
        Ok(rule)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let body = self.0.trim();
        let body = body.strip_prefix("RRULE:").unwrap_or(body);
        if body.is_empty() {
            return Err(ValidationError::InvalidRecurrence(
                "empty RRULE string".to_string(),
            ));
        }
        body.parse::<RRule<Unvalidated>>()
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidRecurrence(format!("{}: {}", self.0, e)))
    }
}

/// A calendar event owned by exactly one calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub status: EventStatus,
    pub calendar_id: String,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        calendar_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            is_all_day: false,
            attendees: Vec::new(),
            recurrence: None,
            reminders: Vec::new(),
            attachments: Vec::new(),
            visibility: Visibility::default(),
            status: EventStatus::default(),
            calendar_id: calendar_id.into(),
            source: EventSource::default(),
            last_modified: Utc::now(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_attendee(mut self, attendee: Attendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = source;
        self
    }

    /// Checks every invariant an event must satisfy before it is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.calendar_id.trim().is_empty() {
            return Err(ValidationError::EmptyCalendarId);
        }
        if self.end < self.start {
            return Err(ValidationError::EndBeforeStart {
                start: self.start,
                end: self.end,
            });
        }
        for attendee in &self.attendees {
            attendee.validate()?;
        }
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }

    /// Events that occupy time: everything except cancelled events.
    pub fn is_blocking(&self) -> bool {
        self.status != EventStatus::Cancelled
    }

    pub fn is_out_of_office(&self) -> bool {
        self.metadata.get_bool(OUT_OF_OFFICE_KEY).unwrap_or(false)
    }

    /// Whether `email` attends this event without having declined.
    pub fn has_participant(&self, email: &str) -> bool {
        self.attendees.iter().any(|a| {
            a.email.eq_ignore_ascii_case(email) && a.status != AttendeeStatus::Declined
        })
    }

    /// Field-by-field equality that ignores `last_modified`.
    pub fn same_content(&self, other: &CalendarEvent) -> bool {
        let mut other = other.clone();
        other.last_modified = self.last_modified;
        *self == other
    }
}

impl Interval for CalendarEvent {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
