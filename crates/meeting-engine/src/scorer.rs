//! Multi-factor desirability scoring and ranking of candidate slots.
//!
//! Points accumulate on a 0–100 scale:
//!
//! | Factor | Points |
//! |--------|--------|
//! | base | +30 |
//! | availability | +40 × availability score |
//! | time of day | +20 × bucket score |
//! | day of week | +10 × weekday score |
//! | far future | −2 per day beyond a week |
//! | short notice | −5 × (1 − days from now) when under a day |
//! | conflicts | −conflict penalty × fraction of attendees in conflict |
//!
//! The total is clamped to `[0, 100]` and divided by 100. Every constant lives
//! in [`ScoringWeights`] and can be tuned through configuration.

use chrono::{DateTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::availability::SlotAvailability;
use crate::error::{EngineError, Result};
use crate::options::SuggestionOptions;
use crate::slot::{MeetingSuggestion, TimeSlot};
use crate::window::local_weekday;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Tunable scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f64,
    pub availability: f64,
    pub time_of_day: f64,
    pub day_of_week: f64,
    /// Weight of the mean per-attendee score in the availability signal.
    pub availability_mean_weight: f64,
    /// Weight of the share of attendees scoring above `breadth_threshold`.
    pub availability_breadth_weight: f64,
    pub breadth_threshold: f64,
    pub far_future_threshold_days: f64,
    pub far_future_penalty_per_day: f64,
    pub short_notice_penalty: f64,
    pub conflict_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 30.0,
            availability: 40.0,
            time_of_day: 20.0,
            day_of_week: 10.0,
            availability_mean_weight: 0.7,
            availability_breadth_weight: 0.3,
            breadth_threshold: 0.5,
            far_future_threshold_days: 7.0,
            far_future_penalty_per_day: 2.0,
            short_notice_penalty: 5.0,
            conflict_penalty: 40.0,
        }
    }
}

impl ScoringWeights {
    /// # Errors
    /// Returns `EngineError::Config` for negative or non-finite weights, or
    /// availability weights that do not sum to 1.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("base", self.base),
            ("availability", self.availability),
            ("time_of_day", self.time_of_day),
            ("day_of_week", self.day_of_week),
            ("availability_mean_weight", self.availability_mean_weight),
            ("availability_breadth_weight", self.availability_breadth_weight),
            ("breadth_threshold", self.breadth_threshold),
            ("far_future_threshold_days", self.far_future_threshold_days),
            ("far_future_penalty_per_day", self.far_future_penalty_per_day),
            ("short_notice_penalty", self.short_notice_penalty),
            ("conflict_penalty", self.conflict_penalty),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "scoring.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let sum = self.availability_mean_weight + self.availability_breadth_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::Config(format!(
                "scoring.availability_mean_weight + scoring.availability_breadth_weight must be 1.0, got {}",
                sum
            )));
        }
        if self.breadth_threshold > 1.0 {
            return Err(EngineError::Config(format!(
                "scoring.breadth_threshold must be within [0, 1], got {}",
                self.breadth_threshold
            )));
        }
        Ok(())
    }
}

/// Fixed-bucket preference curve over the local hour a slot starts in.
pub fn time_of_day_score(hour: u32) -> f64 {
    match hour {
        9..=11 => 1.0,
        12..=15 => 0.9,
        16..=17 => 0.7,
        6..=8 => 0.4,
        18..=20 => 0.3,
        21..=22 => 0.1,
        _ => 0.0,
    }
}

pub fn day_of_week_score(weekday: Weekday, include_weekends: bool) -> f64 {
    match weekday {
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => 1.0,
        Weekday::Fri => 0.9,
        Weekday::Sat if include_weekends => 0.7,
        Weekday::Sun if include_weekends => 0.6,
        Weekday::Sat | Weekday::Sun => 0.0,
    }
}

/// Fractional days between `now` and `start` (negative for past slots).
pub fn days_from_now(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (start - now).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Scores candidate slots relative to a fixed reference instant.
#[derive(Debug, Clone)]
pub struct SuggestionScorer<'a> {
    weights: &'a ScoringWeights,
    options: &'a SuggestionOptions,
    now: DateTime<Utc>,
}

impl<'a> SuggestionScorer<'a> {
    pub fn new(
        weights: &'a ScoringWeights,
        options: &'a SuggestionOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            weights,
            options,
            now,
        }
    }

    fn local_time_of_day(&self, slot: &TimeSlot) -> f64 {
        time_of_day_score(slot.start.with_timezone(&self.options.timezone).hour())
    }

    fn local_day_of_week(&self, slot: &TimeSlot) -> f64 {
        day_of_week_score(
            local_weekday(slot.start, &self.options.timezone),
            self.options.include_weekends,
        )
    }

    /// Raw points on the 0–100 scale, before clamping.
    pub fn points(&self, slot: &TimeSlot, availability: &SlotAvailability) -> f64 {
        let w = self.weights;
        let days = days_from_now(slot.start, self.now);

        let far_future = w.far_future_penalty_per_day * (days - w.far_future_threshold_days).max(0.0);
        let short_notice = w.short_notice_penalty * (1.0 - days).max(0.0);
        let conflicts = w.conflict_penalty * availability.conflict_fraction();

        w.base
            + w.availability * availability.score
            + w.time_of_day * self.local_time_of_day(slot)
            + w.day_of_week * self.local_day_of_week(slot)
            - far_future
            - short_notice
            - conflicts
    }

    /// Desirability in `[0.0, 1.0]`.
    pub fn score(&self, slot: &TimeSlot, availability: &SlotAvailability) -> f64 {
        let points = self.points(slot, availability);
        if points.is_nan() {
            return 0.0;
        }
        points.clamp(0.0, 100.0) / 100.0
    }

    /// Human-readable explanations of what drove a slot's score.
    pub fn reasons(&self, slot: &TimeSlot, availability: &SlotAvailability) -> Vec<String> {
        let mut reasons = Vec::new();

        if availability.attendee_count > 0 {
            let all_free = availability
                .attendee_scores
                .iter()
                .all(|s| *s >= crate::availability::FULLY_AVAILABLE);
            if all_free {
                reasons.push("All attendees are available".to_string());
            } else if availability.score >= 0.7 {
                reasons.push("Most attendees are available".to_string());
            } else if availability.score > 0.0 {
                reasons.push("Some attendees may be unavailable".to_string());
            } else {
                reasons.push("No availability information for attendees".to_string());
            }
        }

        let conflicting = availability.conflicting_attendees.len();
        if conflicting > 0 {
            reasons.push(format!(
                "Conflicts with {} attendee{}",
                conflicting,
                if conflicting == 1 { "" } else { "s" }
            ));
        }

        let time_of_day = self.local_time_of_day(slot);
        if time_of_day >= 1.0 {
            reasons.push("Preferred morning time".to_string());
        } else if time_of_day >= 0.9 {
            reasons.push("Good afternoon time".to_string());
        } else if time_of_day <= 0.3 {
            reasons.push("Outside usual meeting hours".to_string());
        }

        let weekday = local_weekday(slot.start, &self.options.timezone);
        if self.local_day_of_week(slot) >= 1.0 {
            reasons.push("Good day of the week".to_string());
        } else if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            reasons.push("Falls on a weekend".to_string());
        }

        let days = days_from_now(slot.start, self.now);
        if days < 1.0 {
            reasons.push("Short notice".to_string());
        } else if days > self.weights.far_future_threshold_days {
            reasons.push("More than a week away".to_string());
        } else {
            reasons.push("Within the next week".to_string());
        }

        reasons
    }

    /// Score a slot and package it as a suggestion.
    pub fn suggest(&self, slot: &TimeSlot, availability: &SlotAvailability) -> MeetingSuggestion {
        MeetingSuggestion {
            start: slot.start,
            end: slot.end,
            score: self.score(slot, availability),
            reasons: self.reasons(slot, availability),
            conflicting_attendees: availability.conflicting_attendees.clone(),
        }
    }
}

/// Keep suggestions scoring at least `min_score`, order them by score
/// descending (earlier start, then generation order, breaks ties) and keep the
/// first `max_suggestions`.
pub fn rank(
    candidates: Vec<MeetingSuggestion>,
    min_score: f64,
    max_suggestions: usize,
) -> Vec<MeetingSuggestion> {
    let mut ranked: Vec<MeetingSuggestion> = candidates
        .into_iter()
        .filter(|s| s.score >= min_score)
        .collect();
    // `sort_by` is stable, so equal keys keep generation order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.start.cmp(&b.start)));
    ranked.truncate(max_suggestions);
    ranked
}
