use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::scoring::domain::{NoteId, NoteStatus, RatingData, UserId, UserScoringData};
use crate::scoring::{HelpfulnessCalculator, ScoringWeights};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid timestamp")
}

/// Comfortably outside the early-rating window.
pub(crate) fn old_timestamp() -> DateTime<Utc> {
    now() - Duration::days(30)
}

pub(crate) fn user(id: &str) -> UserScoringData {
    UserScoringData::new(UserId(id.to_string()))
}

pub(crate) fn rating(note: &str, rater: &str, helpful: bool) -> RatingData {
    RatingData::new(
        NoteId(note.to_string()),
        UserId(rater.to_string()),
        helpful,
        old_timestamp(),
    )
}

pub(crate) fn no_ratings() -> Vec<RatingData> {
    Vec::new()
}

pub(crate) fn statuses(entries: &[(&str, NoteStatus)]) -> HashMap<NoteId, NoteStatus> {
    entries
        .iter()
        .map(|(note, status)| (NoteId(note.to_string()), *status))
        .collect()
}

pub(crate) fn calculator() -> HelpfulnessCalculator {
    HelpfulnessCalculator::new(ScoringWeights::default())
}

/// History with `successful` helpful ratings on CRH notes and `unsuccessful`
/// helpful ratings on NRH notes, all outside the early window.
pub(crate) fn mixed_history(
    rater: &str,
    successful: usize,
    unsuccessful: usize,
) -> (Vec<RatingData>, HashMap<NoteId, NoteStatus>) {
    let mut ratings = Vec::new();
    let mut status_entries = HashMap::new();

    for index in 0..successful {
        let note = format!("crh-{index}");
        ratings.push(rating(&note, rater, true));
        status_entries.insert(NoteId(note), NoteStatus::CurrentlyRatedHelpful);
    }
    for index in 0..unsuccessful {
        let note = format!("nrh-{index}");
        ratings.push(rating(&note, rater, true));
        status_entries.insert(NoteId(note), NoteStatus::CurrentlyRatedNotHelpful);
    }

    (ratings, status_entries)
}
