//! # meeting-sync
//!
//! Asynchronous collaborators around `meeting-engine`: the local event store,
//! remote calendar providers, concurrent availability fetching, the
//! cancellable planning pipeline, local-first mutations and pull-based
//! reconciliation.
//!
//! Nothing here is global. Every component receives the store or client it
//! uses through its constructor.
//!
//! ## Modules
//!
//! - [`store`] — `EventStore` contract, SQLite implementation, live subscriptions
//! - [`remote`] — `RemoteCalendarClient` contract
//! - [`availability`] — Store, remote, routed and static availability providers
//! - [`aggregator`] — Per-attendee fan-out with timeouts and cancellation
//! - [`planner`] — End-to-end meeting suggestions
//! - [`service`] — Local-first create/update/delete and batches
//! - [`sync`] — Remote-to-local reconciliation
//! - [`cancel`] — Cancellation signal
//! - [`error`] — Error types

pub mod aggregator;
pub mod availability;
pub mod cancel;
pub mod error;
pub mod planner;
pub mod remote;
pub mod service;
pub mod store;
pub mod sync;

pub use aggregator::{AggregatorConfig, AvailabilityAggregator};
pub use availability::{
    AvailabilityProvider, RemoteAvailability, RoutedAvailability, StaticAvailability,
    StoreAvailability,
};
pub use cancel::{cancellation, CancelHandle, CancelSignal};
pub use error::{
    AggregateError, BatchError, FetchError, PlanError, RemoteError, ServiceError, StoreError,
    StoreResult,
};
pub use planner::MeetingPlanner;
pub use remote::RemoteCalendarClient;
pub use service::{
    BatchFailure, BatchPolicy, BatchReport, EventService, MutationOutcome, RemoteOperation,
    RemoteWarning,
};
pub use store::{EventStore, EventSubscription, RangeQuery, SqliteEventStore};
pub use sync::{SyncError, SyncReconciler, SyncResult, SyncState};
