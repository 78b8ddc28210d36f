use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for contributors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for community notes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(pub String);

/// A single rating a contributor placed on a note. Immutable once created;
/// re-rating supersedes the previous record for the same (note, rater) pair
/// upstream, so the calculator always sees at most one per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingData {
    pub note_id: NoteId,
    pub rater_id: UserId,
    pub helpful: bool,
    /// Rating weight, non-negative. Defaults to 1.0 at the intake boundary.
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
    /// Free-form rationale carried through for audit surfaces; never scored.
    pub reason: Option<String>,
}

impl RatingData {
    pub fn new(note_id: NoteId, rater_id: UserId, helpful: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            note_id,
            rater_id,
            helpful,
            weight: 1.0,
            timestamp,
            reason: None,
        }
    }
}

/// Lifecycle status of a note. Transitions are owned by the external
/// ratings-aggregation pass; the scoring core only reads the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Pending,
    CurrentlyRatedHelpful,
    CurrentlyRatedNotHelpful,
    NeedsMoreRatings,
}

impl NoteStatus {
    pub const fn label(self) -> &'static str {
        match self {
            NoteStatus::Pending => "pending",
            NoteStatus::CurrentlyRatedHelpful => "currently_rated_helpful",
            NoteStatus::CurrentlyRatedNotHelpful => "currently_rated_not_helpful",
            NoteStatus::NeedsMoreRatings => "needs_more_ratings",
        }
    }
}

/// Coarse reputation tier, recomputed fresh on every scoring pass. Ordered so
/// callers can compare tiers, but the algorithm never ratchets: a level can
/// move down between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Newcomer,
    Contributor,
    Trusted,
}

impl TrustLevel {
    pub const fn label(self) -> &'static str {
        match self {
            TrustLevel::Newcomer => "newcomer",
            TrustLevel::Contributor => "contributor",
            TrustLevel::Trusted => "trusted",
        }
    }
}

/// Persisted per-user accumulator the calculator reads as a frozen snapshot.
/// Updated only after a batch run; callers must not hand the calculator a
/// snapshot mutated mid-batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserScoringData {
    pub user_id: UserId,
    pub total_notes: u32,
    pub total_ratings: u32,
    pub helpfulness_score: f64,
    pub trust_level: TrustLevel,
    /// Matrix-factorization seed values, carried through unchanged when absent.
    pub rater_intercept: Option<f64>,
    pub rater_factor1: Option<f64>,
}

impl UserScoringData {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            total_notes: 0,
            total_ratings: 0,
            helpfulness_score: 0.0,
            trust_level: TrustLevel::Newcomer,
            rater_intercept: None,
            rater_factor1: None,
        }
    }
}

/// Derived per-pass rating metrics. Never persisted; recomputed from the full
/// rating history and note statuses each run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HelpfulnessMetrics {
    pub successful_helpful: u32,
    pub successful_not_helpful: u32,
    pub unsuccessful_helpful: u32,
    pub unsuccessful_not_helpful: u32,
    pub agreement_ratio: f64,
    pub mean_note_score: f64,
}

impl HelpfulnessMetrics {
    pub fn successful_ratings(&self) -> u32 {
        self.successful_helpful + self.successful_not_helpful
    }

    pub fn unsuccessful_ratings(&self) -> u32 {
        self.unsuccessful_helpful + self.unsuccessful_not_helpful
    }

    pub fn scored_ratings(&self) -> u32 {
        self.successful_ratings() + self.unsuccessful_ratings()
    }
}

/// Output of one scoring pass for one user. Replaces the previous value
/// wholesale; merging semantics belong to whatever persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserScore {
    pub user_id: UserId,
    pub helpfulness_score: f64,
    pub trust_level: TrustLevel,
    pub user_intercept: f64,
    pub user_factor1: f64,
    pub successful_ratings: u32,
    pub unsuccessful_ratings: u32,
    pub agreement_ratio: f64,
    pub mean_note_score: f64,
    pub above_helpfulness_threshold: bool,
    pub is_emerging_contributor: bool,
}
