//! Wall-clock preferred windows and inclusive date ranges.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::{resolve_local, DstPolicy};
use crate::error::ValidationError;

/// Parse a `"HH:MM"` wall-clock time.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

/// A `[start, end)` time-of-day window, interpreted on each calendar day.
///
/// Serialized as a `["HH:MM", "HH:MM"]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(String, String)", into = "(String, String)")]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// # Errors
    /// Returns `ValidationError::InvalidWindow` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidWindow {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_hhmm(start)?, parse_hhmm(end)?)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether both hours lie within the window's start and end hours.
    ///
    /// Minutes are ignored: with 09:00–17:00, a 16:30–17:30 span passes and a
    /// 17:30–18:00 span does not.
    pub fn contains_hours(&self, start_hour: u32, end_hour: u32) -> bool {
        let hours = self.start.hour()..=self.end.hour();
        hours.contains(&start_hour) && hours.contains(&end_hour)
    }
}

impl Default for TimeWindow {
    /// Standard working hours, 09:00–17:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TryFrom<(String, String)> for TimeWindow {
    type Error = ValidationError;

    fn try_from((start, end): (String, String)) -> Result<Self, Self::Error> {
        Self::parse(&start, &end)
    }
}

impl From<TimeWindow> for (String, String) {
    fn from(window: TimeWindow) -> Self {
        (
            window.start.format("%H:%M").to_string(),
            window.end.format("%H:%M").to_string(),
        )
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Every day from `start` through `end`, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// The UTC instants spanning local midnight of `start` to local midnight
    /// after `end`.
    pub fn utc_bounds(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let day_after = self.end.succ_opt().unwrap_or(self.end);
        (
            local_midnight(tz, self.start),
            local_midnight(tz, day_after),
        )
    }
}

fn local_midnight(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    resolve_local(tz, day, NaiveTime::MIN, DstPolicy::ShiftForward)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN).and_utc())
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Weekday of `instant` as seen in `tz`.
pub fn local_weekday(instant: DateTime<Utc>, tz: &Tz) -> Weekday {
    instant.with_timezone(tz).weekday()
}
