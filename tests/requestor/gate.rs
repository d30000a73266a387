use std::time::{Duration, Instant};

use tokio::time::timeout;

use cbm_concepts::requestor::gate::ConcurrencyGate;

#[tokio::test]
async fn given_limit_reached_when_acquiring_then_next_caller_blocks_until_release() {
    let gate = ConcurrencyGate::new(1, None);
    let lease = gate.acquire().await.expect("first permit");

    let second = timeout(Duration::from_millis(40), gate.acquire()).await;
    assert!(second.is_err(), "second acquire should block on the semaphore");

    drop(lease);
    let third = timeout(Duration::from_millis(200), gate.acquire()).await;
    assert!(third.is_ok(), "permit should be available after release");
}

#[tokio::test]
async fn given_zero_limit_when_building_gate_then_one_permit_is_used() {
    let gate = ConcurrencyGate::new(0, None);
    assert_eq!(gate.limit(), 1);
    let _lease = gate.acquire().await.expect("permit");
}

#[tokio::test]
async fn given_rate_smoothing_when_bucket_drains_then_acquire_waits_for_refill() {
    let gate = ConcurrencyGate::new(8, Some(2));
    let started = Instant::now();

    let mut leases = Vec::new();
    for _ in 0..3 {
        leases.push(gate.acquire().await.expect("permit"));
    }

    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "third token should wait for the bucket to refill"
    );
}
