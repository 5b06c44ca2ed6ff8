//! Compute free time slots from interval lists.
//!
//! Sorts intervals by start time, merges overlapping busy periods, then computes
//! the gaps between merged periods within a given time window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// A free time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl Interval for FreeSlot {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of (start, end) intervals.
pub fn merge_busy_periods<T: Interval>(
    busy: &[T],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    // Clip to the window, discarding intervals entirely outside it.
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter(|b| b.start() < window_end && b.end() > window_start)
        .map(|b| (b.start().max(window_start), b.end().min(window_end)))
        .collect();

    if intervals.is_empty() {
        return Vec::new();
    }

    intervals.sort_by_key(|&(start, end)| (start, end));

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                // Overlapping or adjacent — extend the current interval.
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Find free time slots within a given time window, given a list of busy intervals.
///
/// Busy intervals may overlap; they are merged before computing gaps.
/// Returns free slots sorted by start time.
pub fn find_free_slots<T: Interval>(
    busy: &[T],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<FreeSlot> {
    let merged = merge_busy_periods(busy, window_start, window_end);

    let mut free_slots = Vec::new();
    let mut cursor = window_start;

    for (busy_start, busy_end) in &merged {
        if cursor < *busy_start {
            free_slots.push(FreeSlot {
                start: cursor,
                end: *busy_start,
                duration_minutes: (*busy_start - cursor).num_minutes(),
            });
        }
        cursor = cursor.max(*busy_end);
    }

    // Trailing free slot after the last busy period.
    if cursor < window_end {
        free_slots.push(FreeSlot {
            start: cursor,
            end: window_end,
            duration_minutes: (window_end - cursor).num_minutes(),
        });
    }

    free_slots
}

/// Find the first free slot of at least `min_duration_minutes` within the window.
pub fn find_first_free_slot<T: Interval>(
    busy: &[T],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration_minutes: i64,
) -> Option<FreeSlot> {
    find_free_slots(busy, window_start, window_end)
        .into_iter()
        .find(|slot| slot.duration_minutes >= min_duration_minutes)
}
