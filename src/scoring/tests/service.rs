use std::sync::Arc;

use super::common::*;
use crate::aggregation::tests::common::{harness, message, request, EngineHarness};
use crate::aggregation::AggregationConfig;
use crate::events::DomainEvent;
use crate::scoring::domain::{TrustLevel, UserId};
use crate::scoring::service::ScoringError;
use crate::scoring::{ScoringOrchestrator, ScoringWeights};

type MemoryOrchestrator = ScoringOrchestrator<
    crate::aggregation::tests::common::MemoryRequestStore,
    crate::aggregation::tests::common::MemoryAggregationRepository,
    crate::aggregation::tests::common::MemoryPublisher,
>;

fn orchestrator() -> (MemoryOrchestrator, EngineHarness) {
    let harness = harness(AggregationConfig {
        min_requests_for_visibility: 4,
        ..AggregationConfig::default()
    });
    let orchestrator = ScoringOrchestrator::new(
        ScoringWeights::default(),
        harness.engine.clone(),
        harness.publisher.clone(),
    );
    (orchestrator, harness)
}

#[test]
fn batch_scores_every_user_from_one_grouping_pass() {
    let (orchestrator, _harness) = orchestrator();
    let (mut ratings, mut statuses) = mixed_history("alice", 6, 2);
    let (bob_ratings, bob_statuses) = mixed_history("bob", 1, 4);
    ratings.extend(bob_ratings);
    statuses.extend(bob_statuses);

    let users = vec![user("alice"), user("bob"), user("carol")];
    let outcome = orchestrator.batch_calculate_helpfulness(&users, &ratings, &statuses, now());

    assert_eq!(outcome.scores.len(), 3);
    assert!(outcome.failures.is_empty());

    let alice = &outcome.scores[&UserId("alice".to_string())];
    assert_eq!(alice.successful_ratings, 6);
    assert_eq!(alice.unsuccessful_ratings, 2);

    // Bob shares note ids with alice's fixture, so his buckets must come
    // from his own ratings only.
    let bob = &outcome.scores[&UserId("bob".to_string())];
    assert_eq!(bob.successful_ratings + bob.unsuccessful_ratings, 5);

    let carol = &outcome.scores[&UserId("carol".to_string())];
    assert_eq!(carol.helpfulness_score, 0.0);
    assert_eq!(carol.trust_level, TrustLevel::Newcomer);
}

#[test]
fn trust_level_change_emits_one_event() {
    let (orchestrator, harness) = orchestrator();
    let (ratings, statuses) = mixed_history("alice", 20, 0);

    let users = vec![user("alice")];
    let outcome = orchestrator.batch_calculate_helpfulness(&users, &ratings, &statuses, now());
    assert_eq!(
        outcome.scores[&UserId("alice".to_string())].trust_level,
        TrustLevel::Trusted
    );

    let trust_events: Vec<_> = harness
        .publisher
        .events()
        .into_iter()
        .filter(|event| matches!(event, DomainEvent::TrustLevelChanged { .. }))
        .collect();
    match trust_events.as_slice() {
        [DomainEvent::TrustLevelChanged {
            user_id,
            previous,
            current,
        }] => {
            assert_eq!(user_id.0, "alice");
            assert_eq!(*previous, TrustLevel::Newcomer);
            assert_eq!(*current, TrustLevel::Trusted);
        }
        other => panic!("expected exactly one trust event, got {other:?}"),
    }
}

#[test]
fn unchanged_trust_level_emits_nothing() {
    let (orchestrator, harness) = orchestrator();

    let users = vec![user("alice")];
    orchestrator.batch_calculate_helpfulness(&users, &[], &statuses(&[]), now());

    assert!(harness.publisher.events().is_empty());
}

#[test]
fn publish_failure_is_isolated_to_the_affected_user() {
    let (orchestrator, harness) = orchestrator();
    harness.publisher.fail(true);
    let (ratings, statuses) = mixed_history("alice", 20, 0);

    let users = vec![user("alice"), user("bob")];
    let outcome = orchestrator.batch_calculate_helpfulness(&users, &ratings, &statuses, now());

    // Both users still scored; the dropped event is reported per user.
    assert_eq!(outcome.scores.len(), 2);
    match outcome.failures.as_slice() {
        [(user_id, ScoringError::Publish(_))] => assert_eq!(user_id.0, "alice"),
        other => panic!("expected one publish failure, got {other:?}"),
    }
}

#[test]
fn duplicate_snapshots_are_rejected_individually() {
    let (orchestrator, _harness) = orchestrator();

    let users = vec![user("alice"), user("alice"), user("bob")];
    let outcome = orchestrator.batch_calculate_helpfulness(&users, &[], &statuses(&[]), now());

    assert_eq!(outcome.scores.len(), 2);
    match outcome.failures.as_slice() {
        [(user_id, ScoringError::DuplicateUser(_))] => assert_eq!(user_id.0, "alice"),
        other => panic!("expected one duplicate failure, got {other:?}"),
    }
}

#[test]
fn recompute_aggregation_delegates_to_the_engine() {
    let (orchestrator, harness) = orchestrator();
    for requestor in ["alice", "bob", "carol", "dave"] {
        harness
            .engine
            .record_request(request("msg-1", requestor, now()), now())
            .expect("recompute succeeds");
    }

    let row = orchestrator
        .recompute_aggregation(&message("msg-1"), now())
        .expect("delegated recompute succeeds");

    assert!(row.threshold_met);
    assert_eq!(harness.publisher.threshold_met_count(), 1);
}

#[test]
fn same_message_recomputations_serialize_across_threads() {
    let (orchestrator, harness) = orchestrator();
    let orchestrator = Arc::new(orchestrator);

    let mut handles = Vec::new();
    for requestor in ["alice", "bob", "carol", "dave", "erin", "frank"] {
        let engine = harness.engine.clone();
        let requestor = requestor.to_string();
        handles.push(std::thread::spawn(move || {
            engine
                .record_request(request("msg-1", &requestor, now()), now())
                .expect("recompute succeeds")
        }));
    }
    for handle in handles {
        handle.join().expect("thread completes");
    }

    let row = orchestrator
        .recompute_aggregation(&message("msg-1"), now())
        .expect("final recompute succeeds");
    assert_eq!(row.total_requests, 6);
    assert!(row.threshold_met);
    assert_eq!(
        harness.publisher.threshold_met_count(),
        1,
        "racing recomputations must not double-fire the latch event"
    );
}
