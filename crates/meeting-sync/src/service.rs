//! Local-first event mutations.
//!
//! A mutation succeeds once it is committed to the local store. The remote
//! provider is called afterwards; its failure is logged and returned as a
//! warning on the outcome, never as an error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{info, warn};
use meeting_engine::CalendarEvent;

use crate::error::{BatchError, RemoteError, ServiceError};
use crate::remote::RemoteCalendarClient;
use crate::store::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    Create,
    Update,
    Delete,
}

impl RemoteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A remote propagation failure attached to a successful local mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWarning {
    pub operation: RemoteOperation,
    pub event_id: String,
    pub error: RemoteError,
}

impl fmt::Display for RemoteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "remote {} of {} failed: {}",
            self.operation.as_str(),
            self.event_id,
            self.error
        )
    }
}

/// Result of a local mutation plus any non-fatal remote warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub warnings: Vec<RemoteWarning>,
}

impl<T> MutationOutcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// How batch operations react to a failing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failure and return it; later items are never tried.
    #[default]
    AbortOnFirstError,
    /// Try every item and report all failures.
    ContinueOnError,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub index: usize,
    pub error: ServiceError,
}

#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful items in input order.
    pub completed: Vec<T>,
    pub failures: Vec<BatchFailure>,
    pub warnings: Vec<RemoteWarning>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct EventService {
    store: Arc<dyn EventStore>,
    remote: Option<Arc<dyn RemoteCalendarClient>>,
}

impl EventService {
    /// A service that only writes locally.
    pub fn local(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            remote: None,
        }
    }

    pub fn with_remote(store: Arc<dyn EventStore>, remote: Arc<dyn RemoteCalendarClient>) -> Self {
        Self {
            store,
            remote: Some(remote),
        }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub async fn create_event(
        &self,
        event: &CalendarEvent,
    ) -> Result<MutationOutcome<CalendarEvent>, ServiceError> {
        event.validate()?;
        let stored = self.store.upsert_event(event).await?;
        info!(
            "event=event_create module=service status=ok event_id={}",
            stored.id
        );

        let mut warnings = Vec::new();
        if let Some(remote) = &self.remote {
            if let Err(error) = remote.create_event(&stored).await {
                warnings.push(remote_warning(RemoteOperation::Create, &stored.id, error));
            }
        }
        Ok(MutationOutcome {
            value: stored,
            warnings,
        })
    }

    /// Replaces an existing event. An unknown id is a no-op that yields `None`.
    pub async fn update_event(
        &self,
        event: &CalendarEvent,
    ) -> Result<MutationOutcome<Option<CalendarEvent>>, ServiceError> {
        event.validate()?;
        let Some(stored) = self.store.update_event(event).await? else {
            info!(
                "event=event_update module=service status=skipped reason=not_found event_id={}",
                event.id
            );
            return Ok(MutationOutcome::clean(None));
        };
        info!(
            "event=event_update module=service status=ok event_id={}",
            stored.id
        );

        let mut warnings = Vec::new();
        if let Some(remote) = &self.remote {
            if let Err(error) = remote.update_event(&stored).await {
                warnings.push(remote_warning(RemoteOperation::Update, &stored.id, error));
            }
        }
        Ok(MutationOutcome {
            value: Some(stored),
            warnings,
        })
    }

    /// Deletes an event. An unknown id is a no-op that yields `false`.
    pub async fn delete_event(&self, id: &str) -> Result<MutationOutcome<bool>, ServiceError> {
        let Some(existing) = self.store.get_event(id).await? else {
            info!(
                "event=event_delete module=service status=skipped reason=not_found event_id={}",
                id
            );
            return Ok(MutationOutcome::clean(false));
        };

        let deleted = self.store.delete_event(id).await?;
        info!(
            "event=event_delete module=service status=ok event_id={}",
            id
        );

        let mut warnings = Vec::new();
        if let Some(remote) = &self.remote {
            if let Err(error) = remote.delete_event(&existing.calendar_id, id).await {
                warnings.push(remote_warning(RemoteOperation::Delete, id, error));
            }
        }
        Ok(MutationOutcome {
            value: deleted,
            warnings,
        })
    }

    /// Creates events one at a time, in order. No atomicity across the batch.
    pub async fn batch_create_events(
        &self,
        events: &[CalendarEvent],
        policy: BatchPolicy,
    ) -> Result<BatchReport<CalendarEvent>, BatchError> {
        run_batch("batch_create", events.iter(), policy, |event| {
            self.create_event(event)
        })
        .await
    }

    pub async fn batch_update_events(
        &self,
        events: &[CalendarEvent],
        policy: BatchPolicy,
    ) -> Result<BatchReport<Option<CalendarEvent>>, BatchError> {
        run_batch("batch_update", events.iter(), policy, |event| {
            self.update_event(event)
        })
        .await
    }

    pub async fn batch_delete_events(
        &self,
        ids: &[String],
        policy: BatchPolicy,
    ) -> Result<BatchReport<bool>, BatchError> {
        run_batch("batch_delete", ids.iter(), policy, |id| self.delete_event(id)).await
    }
}

fn remote_warning(operation: RemoteOperation, event_id: &str, error: RemoteError) -> RemoteWarning {
    let warning = RemoteWarning {
        operation,
        event_id: event_id.to_string(),
        error,
    };
    warn!(
        "event=remote_propagate module=service status=error operation={} event_id={} unreachable={} error={}",
        operation.as_str(),
        event_id,
        warning.error.is_unreachable(),
        warning.error
    );
    warning
}

async fn run_batch<I, T, F, Fut>(
    name: &str,
    items: impl Iterator<Item = I>,
    policy: BatchPolicy,
    mut op: F,
) -> Result<BatchReport<T>, BatchError>
where
    F: FnMut(I) -> Fut,
    Fut: Future<Output = Result<MutationOutcome<T>, ServiceError>>,
{
    let mut report = BatchReport::default();

    for (index, item) in items.enumerate() {
        match op(item).await {
            Ok(outcome) => {
                report.completed.push(outcome.value);
                report.warnings.extend(outcome.warnings);
            }
            Err(error) => match policy {
                BatchPolicy::AbortOnFirstError => {
                    warn!(
                        "event={} module=service status=aborted index={} completed={} error={}",
                        name,
                        index,
                        report.completed.len(),
                        error
                    );
                    return Err(BatchError {
                        index,
                        completed: report.completed.len(),
                        source: error,
                    });
                }
                BatchPolicy::ContinueOnError => {
                    report.failures.push(BatchFailure { index, error });
                }
            },
        }
    }

    info!(
        "event={} module=service status={} completed={} failed={}",
        name,
        if report.is_success() { "ok" } else { "partial" },
        report.completed.len(),
        report.failures.len()
    );
    Ok(report)
}
