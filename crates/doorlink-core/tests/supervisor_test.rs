#![allow(clippy::unwrap_used)]
// Integration tests for `Supervisor` against in-memory and real transports.

mod common;

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use doorlink_core::{
    CertificateOverride, ConnectionSettings, ConnectionState, CoreError, GrpcConnector,
    Supervisor, TransportMode,
};

use common::{StubConnector, StubLink, supervisor};

// ── connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_succeeds_when_gateway_accepts() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);

    assert!(supervisor.connect().await);
    assert!(supervisor.is_connected());
    assert_eq!(supervisor.state(), ConnectionState::Connected);
    // One liveness probe per connect.
    assert_eq!(connector.link.calls("get_device_list"), 1);
}

#[tokio::test]
async fn test_connect_refused_returns_false() {
    let connector = Arc::new(StubConnector::refusing());
    let supervisor = supervisor(&connector);

    assert!(!supervisor.connect().await);
    assert!(!supervisor.is_connected());
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    assert!(supervisor.current_link().is_none());
}

#[tokio::test]
async fn test_probe_rejection_still_counts_as_connected() {
    // Only transport-class statuses fail the probe.
    let link = StubLink {
        device_list_error: Some(tonic::Status::unimplemented("GetDeviceList")),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let supervisor = supervisor(&connector);

    assert!(supervisor.connect().await);
    assert!(supervisor.is_connected());
}

#[tokio::test]
async fn test_probe_deadline_exceeded_fails_connect() {
    let link = StubLink {
        device_list_error: Some(tonic::Status::deadline_exceeded("probe")),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let supervisor = supervisor(&connector);

    assert!(!supervisor.connect().await);
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_failed_probe_shuts_link_down() {
    let link = StubLink {
        device_list_ok_calls: Some(0),
        ..StubLink::healthy()
    };
    let connector = Arc::new(StubConnector::accepting(link));
    let supervisor = supervisor(&connector);

    assert!(!supervisor.connect().await);
    assert_eq!(connector.link.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_to_closed_port_returns_false() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let settings = ConnectionSettings {
        port,
        connect_timeout: Duration::from_secs(2),
        ..ConnectionSettings::default()
    };
    let supervisor = Supervisor::new(settings, Arc::new(GrpcConnector)).unwrap();

    assert!(!supervisor.connect().await);
    assert!(!supervisor.is_connected());
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
}

// ── configuration ───────────────────────────────────────────────────

#[test]
fn test_mutual_tls_with_missing_key_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let ca = dir.path().join("ca.pem");
    let cert = dir.path().join("client.pem");
    std::fs::write(&ca, "ca").unwrap();
    std::fs::write(&cert, "cert").unwrap();

    let settings = ConnectionSettings {
        mode: TransportMode::MutualTls,
        ca_cert: Some(ca),
        client_cert: Some(cert),
        client_key: Some(dir.path().join("missing.key")),
        ..ConnectionSettings::default()
    };

    let result = Supervisor::new(settings, Arc::new(StubConnector::refusing()));
    assert!(
        matches!(result, Err(CoreError::Config { .. })),
        "expected Config error"
    );
}

// ── disconnect ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    assert!(supervisor.connect().await);

    supervisor.disconnect().await;
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    supervisor.disconnect().await;
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);

    assert_eq!(connector.link.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disconnect_without_connect_is_safe() {
    let connector = Arc::new(StubConnector::refusing());
    let supervisor = supervisor(&connector);
    supervisor.disconnect().await;
    assert_eq!(supervisor.state(), ConnectionState::Disconnected);
}

// ── retry ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_kth_attempt() {
    let connector = Arc::new(StubConnector::accepting_from(StubLink::healthy(), 3));
    let supervisor = supervisor(&connector);

    assert!(supervisor.connect_with_retry(5).await);
    assert!(supervisor.is_connected());
    assert_eq!(connector.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_never_exceeds_max_attempts() {
    let connector = Arc::new(StubConnector::refusing());
    let supervisor = supervisor(&connector);

    let started = tokio::time::Instant::now();
    assert!(!supervisor.connect_with_retry(4).await);
    assert_eq!(connector.attempts(), 4);
    // Backoff 1s + 2s + 4s between the four attempts.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(7), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_retry_returns_immediately_when_connected() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    assert!(supervisor.connect().await);

    assert!(supervisor.connect_with_retry(3).await);
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_retry_backoff() {
    let connector = Arc::new(StubConnector::refusing());
    let supervisor = supervisor(&connector);

    let retrying = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move { supervisor.connect_with_retry(10).await })
    };
    tokio::time::sleep(Duration::from_millis(500)).await;
    supervisor.shutdown().await;

    assert!(!retrying.await.unwrap());
    assert_eq!(connector.attempts(), 1);
}

// ── status notifications ────────────────────────────────────────────

#[tokio::test]
async fn test_status_fires_once_per_flip() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    let mut status = supervisor.subscribe_status();

    assert!(supervisor.connect().await);
    assert!(status.has_changed().unwrap());
    assert!(*status.borrow_and_update());

    // Re-confirmation is not a flip.
    assert!(supervisor.connect().await);
    assert!(!status.has_changed().unwrap());

    supervisor.disconnect().await;
    assert!(status.has_changed().unwrap());
    assert!(!*status.borrow_and_update());
}

#[tokio::test]
async fn test_state_channel_sees_transitions() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    let mut state = supervisor.connection_state();

    assert!(supervisor.connect().await);
    assert_eq!(*state.borrow_and_update(), ConnectionState::Connected);

    let generation = supervisor.current_link().unwrap().generation;
    assert!(supervisor.mark_degraded(generation));
    assert_eq!(*state.borrow_and_update(), ConnectionState::Degraded);
}

// ── generations ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_stale_generation_does_not_degrade() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);

    assert!(supervisor.connect().await);
    let first = supervisor.current_link().unwrap().generation;
    supervisor.disconnect().await;
    assert!(supervisor.connect().await);
    let second = supervisor.current_link().unwrap().generation;
    assert!(second > first);

    assert!(!supervisor.mark_degraded(first));
    assert!(supervisor.is_connected());
    assert!(supervisor.mark_degraded(second));
    assert_eq!(supervisor.state(), ConnectionState::Degraded);
}

#[tokio::test]
async fn test_degraded_connection_reconnects_with_new_generation() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);

    assert!(supervisor.connect().await);
    let first = supervisor.current_link().unwrap().generation;
    supervisor.mark_degraded(first);

    assert!(supervisor.connect().await);
    assert!(supervisor.current_link().unwrap().generation > first);
    // The old link was shut down before the new one was installed.
    assert_eq!(connector.link.shutdowns.load(Ordering::SeqCst), 1);
}

// ── certificate override ────────────────────────────────────────────

#[tokio::test]
async fn test_connect_secure_replaces_link_and_keeps_settings() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    assert!(supervisor.connect().await);
    let first = supervisor.current_link().unwrap().generation;

    assert!(
        supervisor
            .connect_secure(CertificateOverride::AcceptInvalid)
            .await
    );
    assert!(supervisor.current_link().unwrap().generation > first);
    assert_eq!(supervisor.settings().mode, TransportMode::Insecure);
    assert!(!supervisor.settings().ignore_cert_errors);
}

#[tokio::test]
async fn test_connect_secure_on_healthy_link_is_not_a_flip() {
    let connector = Arc::new(StubConnector::accepting(StubLink::healthy()));
    let supervisor = supervisor(&connector);
    assert!(supervisor.connect().await);
    let status = supervisor.subscribe_status();

    assert!(
        supervisor
            .connect_secure(CertificateOverride::AcceptInvalid)
            .await
    );
    assert!(!status.has_changed().unwrap());
    assert!(supervisor.is_connected());
}
