//! Contributor helpfulness scoring: domain types, the pure per-user
//! calculator, and the batch orchestrator.

pub mod calculator;
pub mod domain;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use calculator::{HelpfulnessCalculator, ScoringWeights};
pub use domain::{
    HelpfulnessMetrics, NoteId, NoteStatus, RatingData, TrustLevel, UserId, UserScore,
    UserScoringData,
};
pub use service::{BatchOutcome, ScoringError, ScoringOrchestrator};
