//! Request options shared by slot generation and ranking.

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::ValidationError;
use crate::window::TimeWindow;

pub const DEFAULT_SLOT_INCREMENT_MINUTES: u32 = 15;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionOptions {
    pub include_weekends: bool,
    /// When non-empty, only these weekdays produce slots.
    pub preferred_days: Vec<Weekday>,
    pub consider_working_hours: bool,
    /// Bounds applied when `consider_working_hours` is set, compared by hour.
    pub working_hours: TimeWindow,
    pub slot_increment_minutes: u32,
    pub max_suggestions: usize,
    pub min_score: f64,
    /// Zone in which preferred windows and time-of-day scoring are read.
    pub timezone: Tz,
    pub dst_policy: DstPolicy,
    /// Drop slots that overlap an attendee's busy or out-of-office time.
    pub exclude_conflicts: bool,
}

impl Default for SuggestionOptions {
    fn default() -> Self {
        Self {
            include_weekends: false,
            preferred_days: Vec::new(),
            consider_working_hours: false,
            working_hours: TimeWindow::default(),
            slot_increment_minutes: DEFAULT_SLOT_INCREMENT_MINUTES,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            min_score: DEFAULT_MIN_SCORE,
            timezone: Tz::UTC,
            dst_policy: DstPolicy::default(),
            exclude_conflicts: true,
        }
    }
}

impl SuggestionOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.slot_increment_minutes == 0 {
            return Err(ValidationError::NonPositiveIncrement);
        }
        if self.max_suggestions == 0 {
            return Err(ValidationError::NonPositiveMaxSuggestions);
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ValidationError::MinScoreOutOfRange(self.min_score));
        }
        TimeWindow::new(self.working_hours.start, self.working_hours.end)?;
        Ok(())
    }
}
