//! Ephemeral scheduling values: availability intervals and ranked suggestions.
//!
//! Nothing in this module is ever persisted.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Tentative,
    OutOfOffice,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Tentative => "tentative",
            Self::OutOfOffice => "out_of_office",
        }
    }

    /// Busy and out-of-office time make an attendee unable to meet.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Busy | Self::OutOfOffice)
    }
}

impl FromStr for AvailabilityStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "tentative" => Ok(Self::Tentative),
            "out_of_office" => Ok(Self::OutOfOffice),
            other => Err(ValidationError::UnknownValue {
                kind: "availability status",
                value: other.to_string(),
            }),
        }
    }
}

/// A `[start, end)` interval with an availability status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AvailabilityStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicting_event_ids: Vec<String>,
}

impl TimeSlot {
    /// # Errors
    /// Returns `ValidationError::EmptySlot` unless `end > start`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: AvailabilityStatus,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EmptySlot);
        }
        Ok(Self {
            start,
            end,
            status,
            conflicting_event_ids: Vec::new(),
        })
    }

    pub fn with_conflicts(mut self, event_ids: Vec<String>) -> Self {
        self.conflicting_event_ids = event_ids;
        self
    }
}

impl Interval for TimeSlot {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A ranked candidate meeting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSuggestion {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Desirability in `[0.0, 1.0]`.
    pub score: f64,
    pub reasons: Vec<String>,
    /// Attendees with busy or out-of-office time overlapping this slot.
    pub conflicting_attendees: Vec<String>,
}

impl Interval for MeetingSuggestion {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
