//! End-to-end suggestion pipeline over already-fetched availability.
//!
//! validate → generate slots → evaluate attendees → score → rank.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::availability::{evaluate_slot, AvailabilityMap};
use crate::error::{Result, ValidationError};
use crate::options::SuggestionOptions;
use crate::scorer::{rank, ScoringWeights, SuggestionScorer};
use crate::slot::MeetingSuggestion;
use crate::slots::SlotGenerator;
use crate::window::{DateRange, TimeWindow};

/// A request for ranked meeting times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub duration_minutes: i64,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub preferred_windows: Vec<TimeWindow>,
    pub date_range: DateRange,
    #[serde(default)]
    pub options: SuggestionOptions,
}

impl SuggestionRequest {
    pub fn new(
        duration_minutes: i64,
        attendees: Vec<String>,
        preferred_windows: Vec<TimeWindow>,
        date_range: DateRange,
    ) -> Self {
        Self {
            duration_minutes,
            attendees,
            preferred_windows,
            date_range,
            options: SuggestionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SuggestionOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks the input contract. Called before any availability is fetched.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration(self.duration_minutes));
        }
        if self.attendees.iter().any(|a| a.trim().is_empty()) {
            return Err(ValidationError::EmptyAttendee);
        }
        for window in &self.preferred_windows {
            TimeWindow::new(window.start, window.end)?;
        }
        self.date_range.validate()?;
        self.options.validate()
    }

    /// UTC span covering every day of the request in its timezone.
    pub fn search_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.date_range.utc_bounds(&self.options.timezone)
    }
}

/// Produce ranked suggestions for `request` given each attendee's intervals.
///
/// An empty result is a valid outcome, never an error.
///
/// # Errors
/// Returns `EngineError::Validation` when the request breaks its input contract.
pub fn suggest_meetings(
    request: &SuggestionRequest,
    availability: &AvailabilityMap,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> Result<Vec<MeetingSuggestion>> {
    request.validate()?;

    let generator = SlotGenerator::new(
        request.date_range,
        &request.preferred_windows,
        request.duration_minutes,
        &request.options,
    )?;
    let scorer = SuggestionScorer::new(weights, &request.options, now);

    let mut generated = 0usize;
    let mut candidates = Vec::new();
    for slot in &generator {
        generated += 1;
        let slot_availability = evaluate_slot(
            slot.start,
            slot.end,
            &request.attendees,
            availability,
            weights,
        );
        if request.options.exclude_conflicts && !slot_availability.conflicting_attendees.is_empty()
        {
            continue;
        }
        candidates.push(scorer.suggest(&slot, &slot_availability));
    }

    let considered = candidates.len();
    let ranked = rank(
        candidates,
        request.options.min_score,
        request.options.max_suggestions,
    );
    debug!(
        "event=suggest module=engine status=ok generated={} considered={} returned={}",
        generated,
        considered,
        ranked.len()
    );
    Ok(ranked)
}
