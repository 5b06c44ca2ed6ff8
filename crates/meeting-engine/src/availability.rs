//! Per-attendee availability scoring.
//!
//! Each attendee is described by a list of [`TimeSlot`] intervals
//! (available, busy, tentative, out-of-office). A candidate slot is scored
//! against each attendee's intervals, and the per-attendee scores are reduced
//! into one availability signal that rewards both average confidence and the
//! breadth of confirmed availability.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::event::{CalendarEvent, EventStatus};
use crate::freebusy::{find_free_slots, merge_busy_periods};
use crate::interval::Interval;
use crate::scorer::ScoringWeights;
use crate::slot::{AvailabilityStatus, TimeSlot};

/// Attendee identifier → that attendee's intervals.
pub type AvailabilityMap = HashMap<String, Vec<TimeSlot>>;

/// An available interval fully contains the slot.
pub const FULLY_AVAILABLE: f64 = 1.0;
/// An available interval covers part of the slot.
pub const PARTIALLY_AVAILABLE: f64 = 0.8;
/// Only a tentative interval overlaps the slot.
pub const TENTATIVE: f64 = 0.3;
/// Nothing known about the slot.
pub const UNKNOWN: f64 = 0.0;

/// Score one attendee for `[start, end)`.
pub fn attendee_slot_score(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    intervals: &[TimeSlot],
) -> f64 {
    let available = || {
        intervals
            .iter()
            .filter(|i| i.status == AvailabilityStatus::Available)
    };

    if available().any(|i| i.contains(start, end)) {
        FULLY_AVAILABLE
    } else if available().any(|i| i.overlaps(start, end)) {
        PARTIALLY_AVAILABLE
    } else if intervals
        .iter()
        .any(|i| i.status == AvailabilityStatus::Tentative && i.overlaps(start, end))
    {
        TENTATIVE
    } else {
        UNKNOWN
    }
}

/// Whether any busy or out-of-office interval overlaps `[start, end)`.
pub fn has_blocking_conflict(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    intervals: &[TimeSlot],
) -> bool {
    intervals
        .iter()
        .any(|i| i.status.is_blocking() && i.overlaps(start, end))
}

/// Reduce per-attendee scores into one `[0, 1]` value:
/// `mean_weight * mean + breadth_weight * (scores above threshold / total)`.
///
/// With no attendees there is nobody to be unavailable, so the result is 1.0.
pub fn combined_availability_score(scores: &[f64], weights: &ScoringWeights) -> f64 {
    if scores.is_empty() {
        return 1.0;
    }
    let total = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / total;
    let confirmed = scores
        .iter()
        .filter(|s| **s > weights.breadth_threshold)
        .count() as f64;
    weights.availability_mean_weight * mean + weights.availability_breadth_weight * (confirmed / total)
}

/// Availability of every attendee for one candidate slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAvailability {
    pub score: f64,
    pub attendee_scores: Vec<f64>,
    /// Attendees with blocking time overlapping the slot, in request order.
    pub conflicting_attendees: Vec<String>,
    pub attendee_count: usize,
}

impl SlotAvailability {
    pub fn conflict_fraction(&self) -> f64 {
        if self.attendee_count == 0 {
            return 0.0;
        }
        self.conflicting_attendees.len() as f64 / self.attendee_count as f64
    }
}

/// Evaluate a slot against every attendee. Attendees missing from
/// `availability` have no data and score 0.
pub fn evaluate_slot(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    attendees: &[String],
    availability: &AvailabilityMap,
    weights: &ScoringWeights,
) -> SlotAvailability {
    let mut attendee_scores = Vec::with_capacity(attendees.len());
    let mut conflicting_attendees = Vec::new();

    for attendee in attendees {
        let intervals = availability
            .get(attendee)
            .map(Vec::as_slice)
            .unwrap_or_default();
        attendee_scores.push(attendee_slot_score(start, end, intervals));
        if has_blocking_conflict(start, end, intervals) {
            conflicting_attendees.push(attendee.clone());
        }
    }

    SlotAvailability {
        score: combined_availability_score(&attendee_scores, weights),
        attendee_scores,
        conflicting_attendees,
        attendee_count: attendees.len(),
    }
}

/// Derive availability intervals from a person's own events within a window.
///
/// Cancelled events are ignored. Tentative events become `Tentative` intervals,
/// out-of-office events `OutOfOffice`, remaining events merged `Busy` blocks;
/// the gaps between all of them are `Available`. The result is sorted by start.
pub fn availability_from_events(
    events: &[CalendarEvent],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let occupying: Vec<&CalendarEvent> = events
        .iter()
        .filter(|e| e.is_blocking() && e.start < e.end)
        .filter(|e| e.overlaps(window_start, window_end))
        .collect();

    let (tentative, firm): (Vec<&CalendarEvent>, Vec<&CalendarEvent>) = occupying
        .iter()
        .copied()
        .partition(|e| e.status == EventStatus::Tentative);
    let (out_of_office, busy): (Vec<&CalendarEvent>, Vec<&CalendarEvent>) =
        firm.into_iter().partition(|e| e.is_out_of_office());

    let mut intervals = Vec::new();

    let spans: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        occupying.iter().map(|e| (e.start, e.end)).collect();
    for free in find_free_slots(&spans, window_start, window_end) {
        intervals.push(TimeSlot {
            start: free.start,
            end: free.end,
            status: AvailabilityStatus::Available,
            conflicting_event_ids: Vec::new(),
        });
    }

    intervals.extend(merged_blocks(&busy, AvailabilityStatus::Busy, window_start, window_end));
    intervals.extend(merged_blocks(
        &out_of_office,
        AvailabilityStatus::OutOfOffice,
        window_start,
        window_end,
    ));

    for event in tentative {
        let start = event.start.max(window_start);
        let end = event.end.min(window_end);
        if start < end {
            intervals.push(TimeSlot {
                start,
                end,
                status: AvailabilityStatus::Tentative,
                conflicting_event_ids: vec![event.id.clone()],
            });
        }
    }

    intervals.sort_by_key(|i| (i.start, i.end));
    intervals
}

fn merged_blocks(
    events: &[&CalendarEvent],
    status: AvailabilityStatus,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let spans: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        events.iter().map(|e| (e.start, e.end)).collect();

    merge_busy_periods(&spans, window_start, window_end)
        .into_iter()
        .filter(|(start, end)| start < end)
        .map(|(start, end)| TimeSlot {
            start,
            end,
            status,
            conflicting_event_ids: events
                .iter()
                .filter(|e| e.overlaps(start, end))
                .map(|e| e.id.clone())
                .collect(),
        })
        .collect()
}
