//! Tests for local-first mutations and batch policies.

mod common;

use std::sync::Arc;

use common::{at, event, memory_store, MockRemote};
use meeting_engine::ValidationError;
use meeting_sync::{
    BatchPolicy, EventService, RemoteError, RemoteOperation, ServiceError,
};

fn batch() -> Vec<meeting_engine::CalendarEvent> {
    vec![
        event("first", at(2, 9, 0), at(2, 10, 0)),
        // End before start.
        event("second", at(2, 12, 0), at(2, 11, 0)),
        event("third", at(2, 14, 0), at(2, 15, 0)),
    ]
}

// ============================================================================
// Single mutations
// ============================================================================

#[tokio::test]
async fn create_without_remote_is_clean() {
    let service = EventService::local(memory_store());

    let outcome = service
        .create_event(&event("evt", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    assert!(outcome.is_clean());
    assert_eq!(outcome.value.id, "evt");
}

#[tokio::test]
async fn create_survives_remote_failure() {
    let store = memory_store();
    let remote = Arc::new(
        MockRemote::new().failing_writes(RemoteError::Unreachable("offline".to_string())),
    );
    let service = EventService::with_remote(Arc::clone(&store), remote.clone());

    let outcome = service
        .create_event(&event("evt", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    assert!(store.get_event("evt").await.unwrap().is_some());
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].operation, RemoteOperation::Create);
    assert!(outcome.warnings[0].error.is_unreachable());
    assert_eq!(remote.calls(), vec!["create:evt"]);
}

#[tokio::test]
async fn create_propagates_to_remote() {
    let remote = Arc::new(MockRemote::new());
    let service = EventService::with_remote(memory_store(), remote.clone());

    let outcome = service
        .create_event(&event("evt", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    assert!(outcome.is_clean());
    assert_eq!(remote.calls(), vec!["create:evt"]);
}

#[tokio::test]
async fn validation_blocks_before_any_write() {
    let store = memory_store();
    let remote = Arc::new(MockRemote::new());
    let service = EventService::with_remote(Arc::clone(&store), remote.clone());

    let mut untitled = event("evt", at(2, 9, 0), at(2, 10, 0));
    untitled.title = String::new();
    let err = service.create_event(&untitled).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::EmptyTitle)
    ));
    assert!(store.get_event("evt").await.unwrap().is_none());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn update_of_unknown_id_is_a_noop() {
    let remote = Arc::new(MockRemote::new());
    let service = EventService::with_remote(memory_store(), remote.clone());

    let outcome = service
        .update_event(&event("ghost", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    assert_eq!(outcome.value, None);
    assert!(outcome.is_clean());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn update_replaces_and_warns_on_remote_failure() {
    let store = memory_store();
    let remote = Arc::new(MockRemote::new().failing_writes(RemoteError::RateLimited));
    let service = EventService::with_remote(Arc::clone(&store), remote.clone());
    store
        .upsert_event(&event("evt", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    let mut moved = event("evt", at(2, 13, 0), at(2, 14, 0));
    moved.title = "Moved".to_string();
    let outcome = service.update_event(&moved).await.unwrap();

    let stored = outcome.value.unwrap();
    assert_eq!(stored.start, at(2, 13, 0));
    assert_eq!(store.get_event("evt").await.unwrap().unwrap().title, "Moved");
    assert_eq!(outcome.warnings[0].operation, RemoteOperation::Update);
}

#[tokio::test]
async fn delete_of_unknown_id_is_a_noop() {
    let remote = Arc::new(MockRemote::new());
    let service = EventService::with_remote(memory_store(), remote.clone());

    let outcome = service.delete_event("ghost").await.unwrap();

    assert!(!outcome.value);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn delete_is_local_first() {
    let store = memory_store();
    let remote = Arc::new(MockRemote::new().failing_writes(RemoteError::Unauthorized));
    let service = EventService::with_remote(Arc::clone(&store), remote.clone());
    store
        .upsert_event(&event("evt", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    let outcome = service.delete_event("evt").await.unwrap();

    assert!(outcome.value);
    assert!(store.get_event("evt").await.unwrap().is_none());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(!outcome.warnings[0].error.is_unreachable());
    assert_eq!(remote.calls(), vec!["delete:evt"]);
}

#[tokio::test]
async fn creating_the_same_payload_twice_converges() {
    let store = memory_store();
    let service = EventService::local(Arc::clone(&store));
    let e = event("evt", at(2, 9, 0), at(2, 10, 0));

    let first = service.create_event(&e).await.unwrap().value;
    let second = service.create_event(&e).await.unwrap().value;

    assert!(first.same_content(&second));
    let all = store
        .events_in_range(&meeting_sync::RangeQuery::new(at(2, 0, 0), at(3, 0, 0)))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn batch_aborts_on_first_error_by_default() {
    let store = memory_store();
    let remote = Arc::new(MockRemote::new());
    let service = EventService::with_remote(Arc::clone(&store), remote.clone());

    let err = service
        .batch_create_events(&batch(), BatchPolicy::default())
        .await
        .unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.completed, 1);
    assert!(matches!(
        err.source,
        ServiceError::Validation(ValidationError::EndBeforeStart { .. })
    ));
    assert!(store.get_event("first").await.unwrap().is_some());
    assert!(store.get_event("third").await.unwrap().is_none());
    assert_eq!(remote.calls(), vec!["create:first"]);
}

#[tokio::test]
async fn batch_can_continue_past_failures() {
    let store = memory_store();
    let service = EventService::local(Arc::clone(&store));

    let report = service
        .batch_create_events(&batch(), BatchPolicy::ContinueOnError)
        .await
        .unwrap();

    assert!(!report.is_success());
    let created: Vec<&str> = report.completed.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(created, vec!["first", "third"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert!(store.get_event("third").await.unwrap().is_some());
}

#[tokio::test]
async fn batch_collects_remote_warnings() {
    let remote = Arc::new(
        MockRemote::new().failing_writes(RemoteError::Unreachable("offline".to_string())),
    );
    let service = EventService::with_remote(memory_store(), remote);
    let events = vec![
        event("a", at(2, 9, 0), at(2, 10, 0)),
        event("b", at(2, 10, 0), at(2, 11, 0)),
    ];

    let report = service
        .batch_create_events(&events, BatchPolicy::AbortOnFirstError)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.warnings.len(), 2);
}

#[tokio::test]
async fn batch_update_and_delete() {
    let store = memory_store();
    let service = EventService::local(Arc::clone(&store));
    service
        .create_event(&event("a", at(2, 9, 0), at(2, 10, 0)))
        .await
        .unwrap();

    let updates = vec![
        event("a", at(2, 11, 0), at(2, 12, 0)),
        event("missing", at(2, 11, 0), at(2, 12, 0)),
    ];
    let report = service
        .batch_update_events(&updates, BatchPolicy::AbortOnFirstError)
        .await
        .unwrap();
    assert!(report.completed[0].is_some());
    assert!(report.completed[1].is_none());

    let ids = vec!["a".to_string(), "missing".to_string()];
    let report = service
        .batch_delete_events(&ids, BatchPolicy::AbortOnFirstError)
        .await
        .unwrap();
    assert_eq!(report.completed, vec![true, false]);
    assert!(store.get_event("a").await.unwrap().is_none());
}
