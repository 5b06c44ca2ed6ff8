//! The cancellable suggestion pipeline: validate, fetch availability
//! concurrently, then score and rank.

use chrono::{DateTime, Utc};
use meeting_engine::{suggest_meetings, MeetingSuggestion, ScoringWeights, SuggestionRequest};

use crate::aggregator::AvailabilityAggregator;
use crate::cancel::CancelSignal;
use crate::error::PlanError;

#[derive(Clone)]
pub struct MeetingPlanner {
    aggregator: AvailabilityAggregator,
    weights: ScoringWeights,
}

impl MeetingPlanner {
    pub fn new(aggregator: AvailabilityAggregator, weights: ScoringWeights) -> Self {
        Self {
            aggregator,
            weights,
        }
    }

    pub async fn suggest(
        &self,
        request: &SuggestionRequest,
        cancel: &CancelSignal,
    ) -> Result<Vec<MeetingSuggestion>, PlanError> {
        self.suggest_at(request, Utc::now(), cancel).await
    }

    /// Like [`suggest`](Self::suggest) with an explicit reference instant for
    /// the recency penalties.
    ///
    /// # Errors
    /// Validation failures are reported before any availability is fetched.
    /// `PlanError::Cancelled` if `cancel` fires before scoring starts.
    pub async fn suggest_at(
        &self,
        request: &SuggestionRequest,
        now: DateTime<Utc>,
        cancel: &CancelSignal,
    ) -> Result<Vec<MeetingSuggestion>, PlanError> {
        request.validate()?;

        let (start, end) = request.search_bounds();
        let availability = self
            .aggregator
            .availability(&request.attendees, start, end, cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }
        Ok(suggest_meetings(request, &availability, &self.weights, now)?)
    }
}
