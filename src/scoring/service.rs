use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::calculator::{HelpfulnessCalculator, ScoringWeights};
use super::domain::{NoteId, NoteStatus, RatingData, UserId, UserScore, UserScoringData};
use crate::aggregation::engine::AggregationError;
use crate::aggregation::repository::{AggregationRepository, RequestStore};
use crate::aggregation::{MessageId, RequestAggregation, RequestAggregationEngine};
use crate::events::{DomainEvent, EventPublisher, PublishError};

/// Error raised while scoring a single user. Always isolated: one user's
/// failure never aborts the rest of the batch.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("duplicate scoring snapshot for user {0}")]
    DuplicateUser(String),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Result of one batch scoring pass. Scores replace the previous values
/// wholesale; persistence is the caller's job.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub scores: HashMap<UserId, UserScore>,
    pub failures: Vec<(UserId, ScoringError)>,
}

/// Batch driver over the user population plus the aggregation state machine.
///
/// Groups the full rating set by rater once, scores every user against a
/// frozen snapshot, and emits trust-level-change events; aggregation
/// recomputation delegates to the per-message engine, which owns the
/// threshold-met emission.
pub struct ScoringOrchestrator<S, R, P> {
    calculator: HelpfulnessCalculator,
    engine: Arc<RequestAggregationEngine<S, R, P>>,
    publisher: Arc<P>,
}

impl<S, R, P> ScoringOrchestrator<S, R, P>
where
    S: RequestStore,
    R: AggregationRepository,
    P: EventPublisher,
{
    pub fn new(
        weights: ScoringWeights,
        engine: Arc<RequestAggregationEngine<S, R, P>>,
        publisher: Arc<P>,
    ) -> Self {
        Self {
            calculator: HelpfulnessCalculator::new(weights),
            engine,
            publisher,
        }
    }

    pub fn calculator(&self) -> &HelpfulnessCalculator {
        &self.calculator
    }

    /// Score every user in one pass. Ratings are grouped by rater once, so
    /// the pass is linear in the rating count rather than users × ratings.
    /// Users without ratings still receive a (zero-score) result.
    pub fn batch_calculate_helpfulness(
        &self,
        users: &[UserScoringData],
        all_ratings: &[RatingData],
        note_statuses: &HashMap<NoteId, NoteStatus>,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        let mut by_rater: HashMap<&UserId, Vec<&RatingData>> = HashMap::new();
        for rating in all_ratings {
            by_rater.entry(&rating.rater_id).or_default().push(rating);
        }

        let empty: Vec<&RatingData> = Vec::new();
        let mut outcome = BatchOutcome::default();

        for snapshot in users {
            if outcome.scores.contains_key(&snapshot.user_id) {
                warn!(user_id = %snapshot.user_id.0, "duplicate snapshot in batch");
                outcome.failures.push((
                    snapshot.user_id.clone(),
                    ScoringError::DuplicateUser(snapshot.user_id.0.clone()),
                ));
                continue;
            }

            let ratings = by_rater.get(&snapshot.user_id).unwrap_or(&empty);
            let score =
                self.calculator
                    .calculate(snapshot, ratings.iter().copied(), note_statuses, now);

            if score.trust_level != snapshot.trust_level {
                let event = DomainEvent::TrustLevelChanged {
                    user_id: snapshot.user_id.clone(),
                    previous: snapshot.trust_level,
                    current: score.trust_level,
                };
                if let Err(err) = self.publisher.publish(event) {
                    warn!(user_id = %snapshot.user_id.0, error = %err, "trust event dropped");
                    outcome
                        .failures
                        .push((snapshot.user_id.clone(), ScoringError::from(err)));
                }
            }

            outcome.scores.insert(snapshot.user_id.clone(), score);
        }

        info!(
            users = users.len(),
            ratings = all_ratings.len(),
            scored = outcome.scores.len(),
            failures = outcome.failures.len(),
            "helpfulness batch complete"
        );

        outcome
    }

    /// Recompute one message's request aggregation. Same-message calls are
    /// serialized by the engine; the threshold-met event fires at most once
    /// per accumulation cycle.
    pub fn recompute_aggregation(
        &self,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        self.engine.recompute(message_id, now)
    }

    pub fn aggregation_engine(&self) -> &RequestAggregationEngine<S, R, P> {
        &self.engine
    }
}
