/// Weight and threshold dials backing the helpfulness rubric. The numeric
/// defaults are heuristics carried from the production deployment, not
/// calibrated domain truth; deployments tune them through the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub successful_helpful_weight: f64,
    pub successful_not_helpful_weight: f64,
    /// Applied to every unsuccessful rating; expected negative.
    pub unsuccessful_weight: f64,
    pub early_rater_weight: f64,
    pub note_author_bonus_weight: f64,
    pub poor_performance_threshold: f64,
    pub newcomer_to_contributor_threshold: f64,
    pub contributor_to_trusted_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            successful_helpful_weight: 1.0,
            successful_not_helpful_weight: 1.0,
            unsuccessful_weight: -0.5,
            early_rater_weight: 2.0,
            note_author_bonus_weight: 0.5,
            poor_performance_threshold: -5.0,
            newcomer_to_contributor_threshold: 2.0,
            contributor_to_trusted_threshold: 10.0,
        }
    }
}

/// Ratings placed within this window count toward the early-rater bonus.
pub(crate) const EARLY_RATING_WINDOW_DAYS: i64 = 7;

/// Fraction of `early_rater_weight` awarded per recent rating. A recency
/// incentive, not a precise timing curve.
pub(crate) const EARLY_RATING_FRACTION: f64 = 0.1;
