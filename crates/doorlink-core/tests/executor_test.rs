#![allow(clippy::unwrap_used)]
// Integration tests for `Executor`: caching, admission control, and
// failure classification.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use doorlink_core::{Call, ConnectionState, Executor, Operation, Outcome};
use pretty_assertions::assert_eq;

use common::{StubConnector, StubLink, gateway, stub_settings, supervisor};

fn device_ids(devices: &[doorlink_core::Device]) -> Vec<u32> {
    devices.iter().map(|d| d.id.get()).collect()
}

// ── Caching ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cached_result_survives_later_failure() {
    // Probe + one list succeed, everything after fails.
    let link = StubLink {
        device_list_ok_calls: Some(2),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    let first = gateway.list_devices().await;
    let second = gateway.list_devices().await;

    assert_eq!(device_ids(&first), vec![1, 2]);
    assert_eq!(first, second);
    assert_eq!(connector.link.calls("get_device_list"), 2);
    assert!(gateway.is_connected());
}

#[tokio::test]
async fn test_cache_hit_needs_no_connection() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    let cached = gateway.list_devices().await;
    gateway.supervisor().disconnect().await;

    assert_eq!(gateway.list_devices().await, cached);
}

#[tokio::test]
async fn test_uncacheable_reads_always_call_gateway() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    gateway.door_status(1.into()).await;
    gateway.door_status(1.into()).await;
    gateway.search_devices().await;
    gateway.search_devices().await;

    assert_eq!(connector.link.calls("door_status"), 2);
    assert_eq!(connector.link.calls("search_device"), 2);
}

// ── Admission control ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_saturated_pool_sheds_next_caller_quickly() {
    let link = StubLink {
        block_lock: true,
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);
    let capacity = gateway.executor().capacity();

    let mut blocked = Vec::new();
    for _ in 0..capacity {
        let gateway = gateway.clone();
        blocked.push(tokio::spawn(async move {
            gateway.lock_doors(1.into(), &[1.into()]).await
        }));
    }
    while connector.link.in_flight.load(Ordering::SeqCst) < capacity {
        tokio::task::yield_now().await;
    }
    assert_eq!(gateway.executor().available_permits(), 0);

    let started = tokio::time::Instant::now();
    let outcome = gateway
        .executor()
        .run(Call::new(Operation::LockDoors), |link, deadline| async move {
            link.door_lock(Default::default(), deadline).await
        })
        .await;
    let waited = started.elapsed();

    assert!(matches!(outcome, Outcome::Overloaded), "{outcome:?}");
    assert!(waited >= Duration::from_millis(100), "{waited:?}");
    assert!(waited < Duration::from_millis(200), "{waited:?}");

    connector.link.release.notify_waiters();
    for task in blocked {
        assert!(task.await.unwrap());
    }
    assert_eq!(gateway.executor().available_permits(), capacity);
}

#[tokio::test]
async fn test_permit_released_after_failure() {
    let link = StubLink {
        door_control_error: Some(tonic::Status::permission_denied("door locked out")),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    assert!(!gateway.lock_doors(1.into(), &[1.into()]).await);
    assert_eq!(
        gateway.executor().available_permits(),
        gateway.executor().capacity()
    );
}

// ── Failure classification ──────────────────────────────────────────

#[tokio::test]
async fn test_not_connected_returns_disconnected_without_calling() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    let executor = Executor::new(supervisor, &stub_settings().executor);

    let outcome = executor
        .run(Call::new(Operation::DoorStatus), |link, deadline| async move {
            link.door_status(Default::default(), deadline).await
        })
        .await;

    assert!(matches!(outcome, Outcome::Disconnected));
    assert_eq!(connector.link.calls("door_status"), 0);
}

#[tokio::test]
async fn test_unavailable_degrades_connection() {
    let link = StubLink {
        door_control_error: Some(tonic::Status::unavailable("gateway restarting")),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    let outcome = gateway
        .executor()
        .run(Call::new(Operation::LockDoors), |link, deadline| async move {
            link.door_lock(Default::default(), deadline).await
        })
        .await;

    assert!(matches!(outcome, Outcome::Unavailable));
    assert!(!gateway.is_connected());
    assert_eq!(gateway.state(), ConnectionState::Degraded);
}

#[tokio::test]
async fn test_rejection_keeps_connection() {
    let link = StubLink {
        door_control_error: Some(tonic::Status::invalid_argument("unknown door")),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    let outcome = gateway
        .executor()
        .run(Call::new(Operation::UnlockDoors), |link, deadline| async move {
            link.door_unlock(Default::default(), deadline).await
        })
        .await;

    match outcome {
        Outcome::Rejected(status) => assert_eq!(status.code(), tonic::Code::InvalidArgument),
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert!(gateway.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_local_deadline_times_out_and_degrades() {
    let link = StubLink {
        block_lock: true,
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);

    let outcome = gateway
        .executor()
        .run(
            Call::new(Operation::LockDoors).timeout(Duration::from_secs(2)),
            |link, deadline| async move { link.door_lock(Default::default(), deadline).await },
        )
        .await;

    assert!(matches!(outcome, Outcome::Timeout(d) if d == Duration::from_secs(2)));
    assert_eq!(gateway.state(), ConnectionState::Degraded);
}

#[tokio::test]
async fn test_shutdown_short_circuits_calls() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let gateway = gateway(&connector);
    assert!(gateway.supervisor().connect().await);
    gateway.supervisor().shutdown().await;

    let outcome = gateway
        .executor()
        .run(Call::new(Operation::DoorStatus), |link, deadline| async move {
            link.door_status(Default::default(), deadline).await
        })
        .await;

    assert!(matches!(outcome, Outcome::ShuttingDown));
    assert!(gateway.door_status(1.into()).await.is_empty());
}
