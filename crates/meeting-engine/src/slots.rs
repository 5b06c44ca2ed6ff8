//! Candidate slot generation.
//!
//! Walks each day of a [`DateRange`], and within every preferred window steps a
//! cursor by the slot increment while a full meeting still fits. Slots are
//! produced lazily, one day at a time, and each call to [`SlotGenerator::iter`]
//! starts a fresh, identical sequence.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

use crate::dst::resolve_local;
use crate::error::ValidationError;
use crate::options::SuggestionOptions;
use crate::slot::{AvailabilityStatus, TimeSlot};
use crate::window::{is_weekend, DateRange, TimeWindow};

/// Enumerates candidate meeting slots for a request.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    range: DateRange,
    windows: Vec<TimeWindow>,
    duration: Duration,
    increment: Duration,
    options: SuggestionOptions,
}

impl SlotGenerator {
    /// # Errors
    /// Returns a `ValidationError` for a non-positive duration, an inverted date
    /// range or invalid options.
    pub fn new(
        range: DateRange,
        windows: &[TimeWindow],
        duration_minutes: i64,
        options: &SuggestionOptions,
    ) -> Result<Self, ValidationError> {
        if duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration(duration_minutes));
        }
        range.validate()?;
        options.validate()?;
        for window in windows {
            TimeWindow::new(window.start, window.end)?;
        }

        Ok(Self {
            range,
            windows: windows.to_vec(),
            // Beyond the representable span nothing can fit in a window anyway.
            duration: Duration::try_minutes(duration_minutes).unwrap_or(Duration::MAX),
            increment: Duration::minutes(i64::from(options.slot_increment_minutes)),
            options: options.clone(),
        })
    }

    /// A fresh lazy sequence over every candidate slot.
    pub fn iter(&self) -> Slots<'_> {
        Slots {
            generator: self,
            next_day: Some(self.range.start),
            pending: Vec::new().into_iter(),
        }
    }

    fn day_allowed(&self, day: NaiveDate) -> bool {
        let weekday = day.weekday();
        if is_weekend(weekday) && !self.options.include_weekends {
            return false;
        }
        self.options.preferred_days.is_empty() || self.options.preferred_days.contains(&weekday)
    }

    /// Hour-level check: the local start and end hours must both fall within
    /// the working-hours hours, on the same local day.
    fn within_working_hours(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let tz = &self.options.timezone;
        let local_start = start.with_timezone(tz);
        let local_end = end.with_timezone(tz);
        local_start.date_naive() == local_end.date_naive()
            && self
                .options
                .working_hours
                .contains_hours(local_start.hour(), local_end.hour())
    }

    /// All slots for one day, de-duplicated by `(start, end)` across
    /// overlapping windows, in window order.
    fn slots_for_day(&self, day: NaiveDate) -> Vec<TimeSlot> {
        if !self.day_allowed(day) {
            return Vec::new();
        }

        let tz = &self.options.timezone;
        let policy = self.options.dst_policy;
        let mut seen: HashSet<(DateTime<Utc>, DateTime<Utc>)> = HashSet::new();
        let mut slots = Vec::new();

        for window in &self.windows {
            let (Some(window_start), Some(window_end)) = (
                resolve_local(tz, day, window.start, policy),
                resolve_local(tz, day, window.end, policy),
            ) else {
                continue;
            };

            let mut cursor = window_start;
            while let Some(end) = cursor
                .checked_add_signed(self.duration)
                .filter(|end| *end <= window_end)
            {
                let allowed =
                    !self.options.consider_working_hours || self.within_working_hours(cursor, end);
                if allowed && seen.insert((cursor, end)) {
                    slots.push(TimeSlot {
                        start: cursor,
                        end,
                        status: AvailabilityStatus::Available,
                        conflicting_event_ids: Vec::new(),
                    });
                }
                match cursor.checked_add_signed(self.increment) {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }

        slots
    }
}

impl<'a> IntoIterator for &'a SlotGenerator {
    type Item = TimeSlot;
    type IntoIter = Slots<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy slot sequence produced by [`SlotGenerator::iter`].
pub struct Slots<'a> {
    generator: &'a SlotGenerator,
    next_day: Option<NaiveDate>,
    pending: std::vec::IntoIter<TimeSlot>,
}

impl Iterator for Slots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        loop {
            if let Some(slot) = self.pending.next() {
                return Some(slot);
            }
            let day = self.next_day?;
            let last = self.generator.range.end;
            self.next_day = day.succ_opt().filter(|next| *next <= last);
            self.pending = self.generator.slots_for_day(day).into_iter();
        }
    }
}

/// Collects every candidate slot for the given inputs.
pub fn generate_slots(
    range: DateRange,
    windows: &[TimeWindow],
    duration_minutes: i64,
    options: &SuggestionOptions,
) -> Result<Vec<TimeSlot>, ValidationError> {
    Ok(SlotGenerator::new(range, windows, duration_minutes, options)?
        .iter()
        .collect())
}
