use super::super::domain::TrustLevel;
use super::config::ScoringWeights;
use super::rules::RatingBreakdown;

/// Inputs the trust cascade evaluates. Extracted so each rule reads one flat
/// set of signals instead of reaching back into the rating history.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrustSignals {
    pub score: f64,
    pub total_ratings: u32,
    pub agreement_ratio: f64,
}

impl TrustSignals {
    pub fn from_breakdown(score: f64, breakdown: &RatingBreakdown) -> Self {
        Self {
            score,
            total_ratings: breakdown.scored(),
            agreement_ratio: breakdown.agreement_ratio(),
        }
    }
}

/// One rung of the trust cascade: a named predicate and the level it assigns.
struct TrustRule {
    name: &'static str,
    applies: fn(&TrustSignals, &ScoringWeights) -> bool,
    level: TrustLevel,
}

/// Ordered cascade, first match wins. Kept as an explicit rule table so the
/// precedence is testable in isolation rather than buried in nested branches.
const TRUST_RULES: &[TrustRule] = &[
    TrustRule {
        name: "poor_performance",
        applies: |signals, weights| {
            signals.score < weights.poor_performance_threshold || signals.agreement_ratio < 0.3
        },
        level: TrustLevel::Newcomer,
    },
    TrustRule {
        name: "trusted",
        applies: |signals, weights| {
            signals.score >= weights.contributor_to_trusted_threshold
                && signals.total_ratings >= 20
                && signals.agreement_ratio >= 0.7
        },
        level: TrustLevel::Trusted,
    },
    TrustRule {
        name: "contributor",
        applies: |signals, weights| {
            signals.score >= weights.newcomer_to_contributor_threshold
                && signals.total_ratings >= 5
                && signals.agreement_ratio >= 0.5
        },
        level: TrustLevel::Contributor,
    },
];

/// Evaluate the cascade for one user. Falls back to newcomer when no rule
/// fires; trust is recomputed fresh each pass, never ratcheted.
pub(crate) fn decide_trust_level(signals: &TrustSignals, weights: &ScoringWeights) -> TrustLevel {
    TRUST_RULES
        .iter()
        .find(|rule| (rule.applies)(signals, weights))
        .map(|rule| rule.level)
        .unwrap_or(TrustLevel::Newcomer)
}

/// Name of the rule that decided a user's level, for audit logging.
pub(crate) fn deciding_rule(signals: &TrustSignals, weights: &ScoringWeights) -> &'static str {
    TRUST_RULES
        .iter()
        .find(|rule| (rule.applies)(signals, weights))
        .map(|rule| rule.name)
        .unwrap_or("default_newcomer")
}

/// Informational flag for newcomers trending upward. Evaluated against the
/// trust level the user held before this pass; callers must hand the
/// calculator a frozen snapshot, not a mid-batch mutated one.
pub(crate) fn is_emerging_contributor(
    signals: &TrustSignals,
    previous_level: TrustLevel,
) -> bool {
    previous_level == TrustLevel::Newcomer
        && signals.total_ratings >= 10
        && signals.agreement_ratio >= 0.6
        && signals.score >= 5.0
}
