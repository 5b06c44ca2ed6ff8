//! Error types for meeting-engine operations.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Malformed input, rejected before any computation or persistence happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("id must not be empty")]
    EmptyId,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("calendar id must not be empty")]
    EmptyCalendarId,

    #[error("calendar name must not be empty")]
    EmptyCalendarName,

    #[error("end {end} is before start {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("time slot must end after it starts")]
    EmptySlot,

    #[error("duration must be positive, got {0} minutes")]
    NonPositiveDuration(i64),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("attendee identifier must not be empty")]
    EmptyAttendee,

    #[error("invalid wall-clock time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("preferred window {start}-{end} must start before it ends")]
    InvalidWindow { start: String, end: String },

    #[error("date range start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("slot increment must be positive")]
    NonPositiveIncrement,

    #[error("max suggestions must be positive")]
    NonPositiveMaxSuggestions,

    #[error("min score must be within [0, 1], got {0}")]
    MinScoreOutOfRange(f64),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
