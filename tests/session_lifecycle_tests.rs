//! Session lifecycle integration tests
//!
//! Cover registration limits, the duplicate-call replace policy, idempotent
//! teardown and the inactivity sweep.

mod mock_providers;

use std::sync::Arc;
use std::time::Duration;

use callstream::config::StreamConfig;
use callstream::core::session::{SessionState, TransportMessage};
use callstream::errors::SessionError;

use mock_providers::{
    MockGenerationProvider, MockRecognitionProvider, build_stack, transport_pair,
};

fn small_stack(max_concurrent_calls: usize) -> mock_providers::TestStack {
    let config = StreamConfig {
        max_concurrent_calls,
        ..StreamConfig::default()
    };
    build_stack(
        config,
        Arc::new(MockRecognitionProvider::new(vec![])),
        Arc::new(MockGenerationProvider::new(vec![])),
    )
}

#[tokio::test]
async fn test_capacity_ceiling_rejects_excess_sessions() {
    let stack = small_stack(3);

    let (transport, _rx1) = transport_pair();
    let first = stack.controller.register("CA1", transport).await.unwrap();
    for call_id in ["CA2", "CA3"] {
        let (transport, _rx) = transport_pair();
        stack.controller.register(call_id, transport).await.unwrap();
    }
    assert_eq!(stack.store.len(), 3);

    let (transport, _rx) = transport_pair();
    let err = stack.controller.register("CA4", transport).await.unwrap_err();
    assert!(matches!(err, SessionError::CapacityExceeded));
    assert_eq!(stack.store.len(), 3);

    // Destroying one frees a slot
    stack
        .controller
        .handle_disconnect(&first, SessionState::Closing)
        .await;
    let (transport, _rx) = transport_pair();
    stack.controller.register("CA4", transport).await.unwrap();
    assert_eq!(stack.store.len(), 3);
}

#[tokio::test]
async fn test_malformed_call_ids_rejected() {
    let stack = small_stack(10);

    for bad in ["", "CA 123", "CA123\u{7f}"] {
        let (transport, _rx) = transport_pair();
        let err = stack.controller.register(bad, transport).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)), "id: {bad:?}");
    }
    assert!(stack.store.is_empty());
}

#[tokio::test]
async fn test_duplicate_call_id_replaces_old_session() {
    let stack = small_stack(10);

    let (transport, mut old_rx) = transport_pair();
    let old = stack.controller.register("CA1", transport).await.unwrap();

    let (transport, _new_rx) = transport_pair();
    let new = stack.controller.register("CA1", transport).await.unwrap();

    assert_eq!(stack.store.len(), 1);
    assert!(old.is_destroyed());
    assert!(!new.is_destroyed());
    assert_eq!(old_rx.recv().await, Some(TransportMessage::Close));

    // The new session is the one in the store
    let current = stack.store.get("CA1").unwrap();
    assert!(!current.is_destroyed());
}

#[tokio::test]
async fn test_old_connection_disconnect_leaves_replacement_alive() {
    let stack = small_stack(10);

    let (transport, _old_rx) = transport_pair();
    let old = stack.controller.register("CA1", transport).await.unwrap();

    let (transport, _new_rx) = transport_pair();
    let new = stack.controller.register("CA1", transport).await.unwrap();

    // The replaced connection's read loop exits and reports its disconnect;
    // that must not take the replacement session down with it
    stack
        .controller
        .handle_disconnect(&old, SessionState::Closing)
        .await;

    let current = stack.store.get("CA1").expect("replacement session gone");
    assert!(std::sync::Arc::ptr_eq(&current, &new));
    assert!(!new.is_destroyed());
    assert_eq!(stack.store.len(), 1);

    // The replacement's own disconnect still tears it down
    stack
        .controller
        .handle_disconnect(&new, SessionState::Closing)
        .await;
    assert!(stack.store.is_empty());
    assert_eq!(new.state(), SessionState::Destroyed);
}

#[tokio::test]
async fn test_destroy_is_idempotent() {
    let stack = small_stack(10);

    let (transport, mut rx) = transport_pair();
    let session = stack.controller.register("CA1", transport).await.unwrap();

    stack
        .controller
        .handle_disconnect(&session, SessionState::Closing)
        .await;
    stack
        .controller
        .handle_disconnect(&session, SessionState::Closing)
        .await;
    stack.controller.sweep_once().await;

    assert!(stack.store.is_empty());
    assert_eq!(session.state(), SessionState::Destroyed);

    // Exactly one close reached the transport
    assert_eq!(rx.recv().await, Some(TransportMessage::Close));
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_destroys_only_inactive_sessions() {
    let stack = small_stack(10);

    let (transport, _rx1) = transport_pair();
    let stale = stack.controller.register("CA-stale", transport).await.unwrap();
    let (transport, _rx2) = transport_pair();
    stack.controller.register("CA-live", transport).await.unwrap();

    tokio::time::advance(Duration::from_secs(200)).await;
    stack.store.touch("CA-live");
    tokio::time::advance(Duration::from_secs(101)).await;

    stack.controller.sweep_once().await;

    assert!(stack.store.get("CA-stale").is_none());
    assert!(stack.store.get("CA-live").is_some());
    assert_eq!(stale.state(), SessionState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_then_sweep_race_is_safe() {
    let stack = small_stack(10);

    let (transport, _rx) = transport_pair();
    let session = stack.controller.register("CA1", transport).await.unwrap();

    tokio::time::advance(Duration::from_secs(400)).await;
    stack
        .controller
        .handle_disconnect(&session, SessionState::Closing)
        .await;
    // The sweep runs after the explicit destroy already removed the session
    stack.controller.sweep_once().await;

    assert!(stack.store.is_empty());
}

#[tokio::test]
async fn test_destroy_all_clears_store() {
    let stack = small_stack(10);

    for call_id in ["CA1", "CA2", "CA3"] {
        let (transport, _rx) = transport_pair();
        stack.controller.register(call_id, transport).await.unwrap();
    }
    stack.store.destroy_all().await;
    assert!(stack.store.is_empty());
}
