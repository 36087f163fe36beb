//! Integration tests for wardend
//!
//! These tests drive the agent loops against a real warden-server instance
//! over HTTP, with the host side mocked.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use warden_api::ClientName;
use warden_core::{
    CycleOutcome, DnsTimer, DnsTimerPolicy, HttpStateStore, LockIntent, LockReconciler,
    ReconcileAction, ReconcilePolicy, Supervisor,
};
use warden_host_api::MockHost;
use warden_server::{AppState, router};
use warden_store::ClientRegistry;

async fn spawn_server() -> (String, Arc<AppState>) {
    let state = Arc::new(AppState::new(ClientRegistry::in_memory()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

/// An address nothing listens on
async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn fast_policy() -> ReconcilePolicy {
    ReconcilePolicy {
        poll_interval: Duration::from_millis(10),
        error_backoff: Duration::from_millis(10),
        fetch_attempts: 2,
        retry_delay: Duration::from_millis(5),
        failure_threshold: 5,
    }
}

#[tokio::test]
async fn test_first_contact_locks_the_workstation() {
    let (base, state) = spawn_server().await;
    let store = Arc::new(HttpStateStore::new(&base, &ClientName::new("desk-01")));
    let host = Arc::new(MockHost::new());
    let mut reconciler = LockReconciler::new(store, host.clone(), fast_policy());

    let outcome = reconciler.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Reconciled {
            action: ReconcileAction::Lock
        }
    );
    assert!(host.is_locked());
    assert_eq!(reconciler.intent(), LockIntent::Locked);

    // polling alone registered the client, locked
    assert_eq!(state.registry.len(), 1);
    let config = state.registry.fetch_or_register(&ClientName::new("desk-01"));
    assert!(!config.unlock_allowed);
}

#[tokio::test]
async fn test_unlock_via_api_is_honoured_without_action() {
    let (base, _state) = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/client/desk-01/unlock-status"))
        .query(&[("unlock_allowed", "true")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let store = Arc::new(HttpStateStore::new(&base, &ClientName::new("desk-01")));
    let host = Arc::new(MockHost::new());
    let mut reconciler = LockReconciler::new(store, host.clone(), fast_policy());

    let outcome = reconciler.run_cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Reconciled {
            action: ReconcileAction::None
        }
    );
    assert_eq!(host.lock_calls(), 0);
    assert!(!host.is_locked());
    assert_eq!(reconciler.intent(), LockIntent::Unlocked);
}

#[tokio::test]
async fn test_outage_escalates_to_safety_lock() {
    let base = dead_endpoint().await;
    let store = Arc::new(HttpStateStore::new(&base, &ClientName::new("desk-01")));
    let host = Arc::new(MockHost::new());
    host.set_locked(true); // normal reconciliation has nothing to do
    let mut reconciler = LockReconciler::new(store, host.clone(), fast_policy());

    for expected in 1..=4 {
        let outcome = reconciler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::FetchFailed { .. }));
        assert_eq!(reconciler.consecutive_failures(), expected);
    }
    assert_eq!(host.lock_calls(), 0);

    let outcome = reconciler.run_cycle().await;
    assert_eq!(outcome, CycleOutcome::SafetyLocked);
    assert_eq!(host.lock_calls(), 1);
    assert_eq!(reconciler.consecutive_failures(), 0);
}

#[tokio::test]
async fn test_timer_from_api_paces_the_block_pass() {
    let (base, _state) = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/client/desk-01/youtube-timer"))
        .query(&[("timer_seconds", "1")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let store = Arc::new(HttpStateStore::new(&base, &ClientName::new("desk-01")));
    let host = Arc::new(MockHost::new());
    let timer = DnsTimer::new(store, host.clone(), DnsTimerPolicy::default());

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(timer.run(rx));

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(host.flush_calls() >= 1);
    assert!(host.block_calls() >= 1);
    assert!(!host.blocked_domains().is_empty());

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("DNS timer did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_supervisor_stop_interrupts_the_default_wait() {
    let (base, _state) = spawn_server().await;
    let store = Arc::new(HttpStateStore::new(&base, &ClientName::new("desk-01")));
    let host = Arc::new(MockHost::new());

    // Default registration leaves a 300 s timer, so the DNS task sits in a
    // long wait almost immediately.
    let reconciler =
        LockReconciler::new(store.clone(), host.clone(), ReconcilePolicy::default());
    let dns_timer = DnsTimer::new(store, host, DnsTimerPolicy::default());
    let mut supervisor = Supervisor::new(reconciler, dns_timer);

    supervisor.start_dns_timer();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(2), supervisor.stop())
        .await
        .expect("stop did not finish in time");
}
