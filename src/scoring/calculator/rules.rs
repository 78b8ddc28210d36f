use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::super::domain::{HelpfulnessMetrics, NoteId, NoteStatus, RatingData};
use super::config::{ScoringWeights, EARLY_RATING_FRACTION, EARLY_RATING_WINDOW_DAYS};

/// Per-user rating tallies produced by one analysis pass. Everything the
/// score, the trust policy, and the output metrics need in one walk over the
/// history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RatingBreakdown {
    pub successful_helpful: u32,
    pub successful_not_helpful: u32,
    pub unsuccessful_helpful: u32,
    pub unsuccessful_not_helpful: u32,
    /// Ratings placed within the early-rating window ending at `now`.
    pub early_ratings: u32,
    /// Malformed records dropped from this pass (non-finite or negative weight).
    pub rejected_ratings: u32,
    /// Sum of weight-scaled alignment scores over scored ratings.
    alignment_sum: f64,
}

impl RatingBreakdown {
    pub fn successful(&self) -> u32 {
        self.successful_helpful + self.successful_not_helpful
    }

    pub fn unsuccessful(&self) -> u32 {
        self.unsuccessful_helpful + self.unsuccessful_not_helpful
    }

    pub fn scored(&self) -> u32 {
        self.successful() + self.unsuccessful()
    }

    pub fn agreement_ratio(&self) -> f64 {
        if self.scored() == 0 {
            0.0
        } else {
            f64::from(self.successful()) / f64::from(self.scored())
        }
    }

    pub fn mean_note_score(&self) -> f64 {
        if self.scored() == 0 {
            0.0
        } else {
            self.alignment_sum / f64::from(self.scored())
        }
    }

    pub fn metrics(&self) -> HelpfulnessMetrics {
        HelpfulnessMetrics {
            successful_helpful: self.successful_helpful,
            successful_not_helpful: self.successful_not_helpful,
            unsuccessful_helpful: self.unsuccessful_helpful,
            unsuccessful_not_helpful: self.unsuccessful_not_helpful,
            agreement_ratio: self.agreement_ratio(),
            mean_note_score: self.mean_note_score(),
        }
    }
}

/// Walk a user's complete rating history, bucketing each rating by whether
/// its stance matched the note's eventual status. Notes missing from the
/// status map or still pending are excluded entirely; malformed records are
/// dropped individually without failing the pass.
pub(crate) fn analyze_ratings<'a, I>(
    ratings: I,
    statuses: &HashMap<NoteId, NoteStatus>,
    now: DateTime<Utc>,
) -> RatingBreakdown
where
    I: IntoIterator<Item = &'a RatingData>,
{
    let early_cutoff = now - Duration::days(EARLY_RATING_WINDOW_DAYS);
    let mut breakdown = RatingBreakdown::default();

    for rating in ratings {
        if !rating.weight.is_finite() || rating.weight < 0.0 {
            warn!(
                note_id = %rating.note_id.0,
                weight = rating.weight,
                "dropping rating with malformed weight"
            );
            breakdown.rejected_ratings += 1;
            continue;
        }

        if rating.timestamp > early_cutoff && rating.timestamp <= now {
            breakdown.early_ratings += 1;
        }

        let status = match statuses.get(&rating.note_id) {
            Some(NoteStatus::Pending) | None => continue,
            Some(status) => *status,
        };

        let successful = match status {
            NoteStatus::CurrentlyRatedHelpful => rating.helpful,
            _ => !rating.helpful,
        };

        match (rating.helpful, successful) {
            (true, true) => breakdown.successful_helpful += 1,
            (false, true) => breakdown.successful_not_helpful += 1,
            (true, false) => breakdown.unsuccessful_helpful += 1,
            (false, false) => breakdown.unsuccessful_not_helpful += 1,
        }

        breakdown.alignment_sum += alignment(rating.helpful, status) * rating.weight;
    }

    breakdown
}

/// Alignment of one rating with the note's final status: +1 when the stance
/// matched a terminal status, -1 when it opposed one, 0 for notes that ended
/// the pass still needing more ratings.
fn alignment(helpful: bool, status: NoteStatus) -> f64 {
    match status {
        NoteStatus::CurrentlyRatedHelpful => {
            if helpful {
                1.0
            } else {
                -1.0
            }
        }
        NoteStatus::CurrentlyRatedNotHelpful => {
            if helpful {
                -1.0
            } else {
                1.0
            }
        }
        NoteStatus::NeedsMoreRatings | NoteStatus::Pending => 0.0,
    }
}

/// Linear helpfulness score over the bucket tallies plus the recency and
/// authorship bonuses.
pub(crate) fn linear_score(
    breakdown: &RatingBreakdown,
    total_notes: u32,
    weights: &ScoringWeights,
) -> f64 {
    let early_bonus =
        f64::from(breakdown.early_ratings) * weights.early_rater_weight * EARLY_RATING_FRACTION;

    f64::from(breakdown.successful_helpful) * weights.successful_helpful_weight
        + f64::from(breakdown.successful_not_helpful) * weights.successful_not_helpful_weight
        + f64::from(breakdown.unsuccessful()) * weights.unsuccessful_weight
        + early_bonus
        + f64::from(total_notes) * weights.note_author_bonus_weight
}
