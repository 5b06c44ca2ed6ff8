//! Detect overlapping events.
//!
//! All checks use half-open intervals: adjacent events (where one ends exactly
//! when another starts) are NOT conflicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;
use crate::interval::{overlap_minutes, Interval};

/// A detected conflict between two events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub event_a: String,
    pub event_b: String,
    pub overlap_minutes: i64,
}

/// Events overlapping `[start, end)`, skipping the event whose id is
/// `exclude_id` (an event being edited never conflicts with itself).
///
/// Input order is preserved.
pub fn conflicts<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &'a [CalendarEvent],
    exclude_id: Option<&str>,
) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|event| exclude_id != Some(event.id.as_str()))
        .filter(|event| event.overlaps(start, end))
        .collect()
}

/// Whether `[start, end)` is clear of every event except `exclude_id`.
pub fn is_free(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &[CalendarEvent],
    exclude_id: Option<&str>,
) -> bool {
    conflicts(start, end, events, exclude_id).is_empty()
}

/// Items of any interval type overlapping `[start, end)`.
pub fn overlapping<'a, T: Interval>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    items: &'a [T],
) -> impl Iterator<Item = &'a T> + 'a {
    items.iter().filter(move |item| item.overlaps(start, end))
}

/// Find all pairwise conflicts (overlapping time ranges) between two event lists.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(events_a: &[CalendarEvent], events_b: &[CalendarEvent]) -> Vec<Conflict> {
    let mut found = Vec::new();

    for a in events_a {
        for b in events_b {
            if a.overlaps(b.start, b.end) {
                found.push(Conflict {
                    event_a: a.id.clone(),
                    event_b: b.id.clone(),
                    overlap_minutes: overlap_minutes(a.start, a.end, b.start, b.end),
                });
            }
        }
    }

    found
}

/// Every overlapping pair within a single list, each pair reported once in
/// input order. Cancelled events are skipped.
pub fn overlapping_pairs(events: &[CalendarEvent]) -> Vec<Conflict> {
    let blocking: Vec<&CalendarEvent> = events.iter().filter(|e| e.is_blocking()).collect();
    let mut found = Vec::new();

    for (i, a) in blocking.iter().enumerate() {
        for b in &blocking[i + 1..] {
            if a.overlaps(b.start, b.end) {
                found.push(Conflict {
                    event_a: a.id.clone(),
                    event_b: b.id.clone(),
                    overlap_minutes: overlap_minutes(a.start, a.end, b.start, b.end),
                });
            }
        }
    }

    found
}
