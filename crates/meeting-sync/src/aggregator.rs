//! Concurrent per-attendee availability fetches.
//!
//! One task per distinct attendee, each bounded by the configured timeout. A
//! failed or timed-out fetch records an empty list for that attendee (treated
//! as unavailable) and never fails the others. The whole fan-out stops as soon
//! as the cancel signal fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use meeting_engine::{AvailabilityMap, TimeSlot};
use tokio::task::JoinSet;

use crate::availability::AvailabilityProvider;
use crate::cancel::CancelSignal;
use crate::error::{AggregateError, FetchError};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Upper bound on one attendee's fetch.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

enum FetchOutcome {
    Fetched(Vec<TimeSlot>),
    Failed(FetchError),
    TimedOut,
}

#[derive(Clone)]
pub struct AvailabilityAggregator {
    provider: Arc<dyn AvailabilityProvider>,
    config: AggregatorConfig,
}

impl AvailabilityAggregator {
    pub fn new(provider: Arc<dyn AvailabilityProvider>, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Every attendee's intervals within `[start, end)`.
    ///
    /// Each requested attendee appears in the result, with an empty list when
    /// their fetch failed.
    ///
    /// # Errors
    /// Returns `AggregateError::Cancelled` if `cancel` fires first; outstanding
    /// fetches are aborted.
    pub async fn availability(
        &self,
        attendees: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: &CancelSignal,
    ) -> Result<AvailabilityMap, AggregateError> {
        if cancel.is_cancelled() {
            return Err(AggregateError::Cancelled);
        }

        let mut result: AvailabilityMap = attendees
            .iter()
            .map(|attendee| (attendee.clone(), Vec::new()))
            .collect();

        let mut tasks = JoinSet::new();
        for attendee in result.keys() {
            let provider = Arc::clone(&self.provider);
            let attendee = attendee.clone();
            let timeout = self.config.fetch_timeout;
            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(
                    timeout,
                    provider.availability(&attendee, start, end),
                )
                .await
                {
                    Ok(Ok(slots)) => FetchOutcome::Fetched(slots),
                    Ok(Err(err)) => FetchOutcome::Failed(err),
                    Err(_) => FetchOutcome::TimedOut,
                };
                (attendee, outcome)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    debug!(
                        "event=availability_fanout module=aggregator status=cancelled attendees={}",
                        result.len()
                    );
                    return Err(AggregateError::Cancelled);
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    match joined {
                        Ok((attendee, FetchOutcome::Fetched(slots))) => {
                            result.insert(attendee, slots);
                        }
                        Ok((attendee, FetchOutcome::Failed(err))) => {
                            warn!(
                                "event=availability_fetch module=aggregator status=error attendee={} error={}",
                                attendee, err
                            );
                        }
                        Ok((attendee, FetchOutcome::TimedOut)) => {
                            warn!(
                                "event=availability_fetch module=aggregator status=timeout attendee={} timeout_ms={}",
                                attendee,
                                self.config.fetch_timeout.as_millis()
                            );
                        }
                        Err(err) => {
                            warn!(
                                "event=availability_fetch module=aggregator status=error error={}",
                                err
                            );
                        }
                    }
                }
            }
        }

        debug!(
            "event=availability_fanout module=aggregator status=ok attendees={}",
            result.len()
        );
        Ok(result)
    }
}
