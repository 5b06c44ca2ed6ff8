//! Calendars: named containers that events refer to by id.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::EventSource;

fn default_color() -> String {
    "#4285f4".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub source: EventSource,
    /// IANA timezone name, e.g. `"Europe/Berlin"`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub can_write: bool,
}

impl Calendar {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: default_color(),
            is_visible: true,
            sync_enabled: false,
            source: EventSource::Local,
            timezone: default_timezone(),
            can_write: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCalendarName);
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ValidationError> {
        self.timezone
            .parse()
            .map_err(|_| ValidationError::InvalidTimezone(self.timezone.clone()))
    }
}
