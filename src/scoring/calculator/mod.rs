mod config;
pub(crate) mod policy;
pub(crate) mod rules;

pub use config::ScoringWeights;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::{HelpfulnessMetrics, NoteId, NoteStatus, UserScore, UserScoringData};
use policy::TrustSignals;

/// Stateless evaluator turning one user's complete rating history plus final
/// note outcomes into a fresh [`UserScore`].
///
/// Pure and deterministic: identical inputs yield identical output, inputs
/// are never mutated, and a well-formed empty history produces a valid
/// zero-score newcomer result.
pub struct HelpfulnessCalculator {
    weights: ScoringWeights,
}

impl HelpfulnessCalculator {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one user. `ratings` must be the user's complete history, not a
    /// delta — the score is recomputed from scratch each pass. Notes missing
    /// from `statuses` or still pending neither help nor hurt.
    pub fn calculate<'a, I>(
        &self,
        snapshot: &UserScoringData,
        ratings: I,
        statuses: &HashMap<NoteId, NoteStatus>,
        now: DateTime<Utc>,
    ) -> UserScore
    where
        I: IntoIterator<Item = &'a super::domain::RatingData>,
    {
        let breakdown = rules::analyze_ratings(ratings, statuses, now);
        let score = rules::linear_score(&breakdown, snapshot.total_notes, &self.weights);
        let signals = TrustSignals::from_breakdown(score, &breakdown);

        let trust_level = policy::decide_trust_level(&signals, &self.weights);

        debug!(
            user_id = %snapshot.user_id.0,
            score,
            trust_level = trust_level.label(),
            rule = policy::deciding_rule(&signals, &self.weights),
            rejected = breakdown.rejected_ratings,
            "scored user"
        );

        UserScore {
            user_id: snapshot.user_id.clone(),
            helpfulness_score: score,
            trust_level,
            user_intercept: snapshot.rater_intercept.unwrap_or(0.0),
            user_factor1: snapshot.rater_factor1.unwrap_or(0.0),
            successful_ratings: breakdown.successful(),
            unsuccessful_ratings: breakdown.unsuccessful(),
            agreement_ratio: breakdown.agreement_ratio(),
            mean_note_score: breakdown.mean_note_score(),
            above_helpfulness_threshold: score >= self.weights.newcomer_to_contributor_threshold,
            is_emerging_contributor: policy::is_emerging_contributor(
                &signals,
                snapshot.trust_level,
            ),
        }
    }

    /// Metrics-only view of a history, for surfaces that render rating
    /// tallies without needing the trust decision.
    pub fn metrics<'a, I>(
        &self,
        ratings: I,
        statuses: &HashMap<NoteId, NoteStatus>,
        now: DateTime<Utc>,
    ) -> HelpfulnessMetrics
    where
        I: IntoIterator<Item = &'a super::domain::RatingData>,
    {
        rules::analyze_ratings(ratings, statuses, now).metrics()
    }
}

impl Default for HelpfulnessCalculator {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}
