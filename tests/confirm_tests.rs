
use std::sync::Arc;

use sms_verifier::events::{EventBus, VerifierEvent};
use sms_verifier::pool::{ClaimOutcome, JobClaimer, MessageState};
use sms_verifier::sms::SendResult;
use sms_verifier::store::MemoryJobStore;
use sms_verifier::worker::{ConfirmOutcome, DeliveryConfirmer};

use test_harness::{seed_job, stored_job, test_node, NETWORK};

async fn claimed_store() -> Arc<MemoryJobStore> {
    let store = Arc::new(MemoryJobStore::new());
    seed_job(&store, "m1", "+15551234", "hi").await;
    let claimer = JobClaimer::new(store.clone(), "v1", NETWORK, 160);
    assert!(matches!(claimer.claim("m1").await, ClaimOutcome::Claimed(_)));
    store
}

#[tokio::test]
async fn test_success_marks_job_sent() {
    let store = claimed_store().await;
    let confirmer = DeliveryConfirmer::new(store.clone(), NETWORK, EventBus::new());

    let before = chrono::Utc::now();
    assert_eq!(
        confirmer.confirm("m1", SendResult::Ok).await,
        ConfirmOutcome::Confirmed
    );

    let job = stored_job(&store, "m1").await.unwrap();
    assert_eq!(job.state, MessageState::Sent);
    assert_eq!(job.assigned_verifier_id.as_deref(), Some("v1"));
    let finished = job.finished_at.expect("finish time set");
    // Stored with millisecond precision.
    assert!(finished.timestamp_millis() >= before.timestamp_millis());
}

#[tokio::test]
async fn test_failure_leaves_job_assigned() {
    let store = claimed_store().await;
    let confirmer = DeliveryConfirmer::new(store.clone(), NETWORK, EventBus::new());

    for result in [
        SendResult::GenericFailure,
        SendResult::RadioOff,
        SendResult::NullPdu,
        SendResult::NoService,
        SendResult::Other(42),
    ] {
        assert_eq!(
            confirmer.confirm("m1", result).await,
            ConfirmOutcome::NotDelivered(result)
        );
    }

    let job = stored_job(&store, "m1").await.unwrap();
    assert_eq!(job.state, MessageState::Assigned);
    assert!(job.finished_at.is_none());
}

#[tokio::test]
async fn test_store_error_is_reported() {
    let store = claimed_store().await;
    let confirmer = DeliveryConfirmer::new(store.clone(), NETWORK, EventBus::new());
    store.set_unavailable(true);

    let outcome = confirmer.confirm("m1", SendResult::Ok).await;
    assert!(matches!(outcome, ConfirmOutcome::StoreError(_)));

    store.set_unavailable(false);
    assert_eq!(
        stored_job(&store, "m1").await.unwrap().state,
        MessageState::Assigned
    );
}

#[tokio::test]
async fn test_every_result_is_published() {
    let store = claimed_store().await;
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let confirmer = DeliveryConfirmer::new(store, NETWORK, events);

    confirmer.confirm("m1", SendResult::RadioOff).await;
    confirmer.confirm("m1", SendResult::Ok).await;

    let mut results = Vec::new();
    for _ in 0..2 {
        match rx.recv().await.unwrap() {
            VerifierEvent::DeliveryResult { message_id, result } => {
                assert_eq!(message_id, "m1");
                results.push(result);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(results, vec![SendResult::RadioOff, SendResult::Ok]);
}

#[tokio::test]
async fn test_result_for_unclaimed_job_is_ignored() {
    let store = Arc::new(MemoryJobStore::new());
    seed_job(&store, "m1", "+15551234", "hi").await;
    let t = test_node("v1", store.clone());

    // Nothing was dispatched for m1 on this node.
    assert!(!t.node.deliver_send_result("m1", SendResult::Ok).await);

    let job = stored_job(&store, "m1").await.unwrap();
    assert_eq!(job.state, MessageState::Dispatching);
    assert!(job.finished_at.is_none());
}
