use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::UserId;

/// Identifier wrapper for flagged messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Identifier wrapper for the server (guild) a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(pub String);

/// One user's request for a note on a message. Unique per
/// (message, requestor); deactivated on withdrawal or expiry rather than
/// deleted so the audit trail survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub message_id: MessageId,
    pub server_id: ServerId,
    pub requestor_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub is_active: bool,
}

impl NoteRequest {
    pub fn new(
        message_id: MessageId,
        server_id: ServerId,
        requestor_id: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            server_id,
            requestor_id,
            timestamp,
            is_active: true,
        }
    }
}

/// Per-message aggregation row. Counts are always recomputed from the
/// authoritative active-request list; `threshold_met` and `threshold_met_at`
/// form a one-way latch that recomputation never clears — only an explicit
/// cycle reset does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAggregation {
    pub message_id: MessageId,
    pub server_id: ServerId,
    pub total_requests: u32,
    pub unique_requestors: u32,
    pub first_request_at: Option<DateTime<Utc>>,
    pub last_request_at: Option<DateTime<Utc>>,
    pub threshold_met: bool,
    pub threshold_met_at: Option<DateTime<Utc>>,
    pub contributors_notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
}

impl RequestAggregation {
    pub fn new(message_id: MessageId, server_id: ServerId) -> Self {
        Self {
            message_id,
            server_id,
            total_requests: 0,
            unique_requestors: 0,
            first_request_at: None,
            last_request_at: None,
            threshold_met: false,
            threshold_met_at: None,
            contributors_notified: false,
            notified_at: None,
        }
    }

    /// Begin a fresh accumulation window, clearing the latch and the
    /// notification marker while keeping the request history timestamps.
    pub fn reset_cycle(&mut self) {
        self.threshold_met = false;
        self.threshold_met_at = None;
        self.contributors_notified = false;
        self.notified_at = None;
    }
}

/// Threshold and expiry dials for request aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    /// Active requests needed before contributors are notified.
    pub min_requests_for_visibility: u32,
    /// Requests older than this are deactivated by the expiry sweep.
    pub request_timeout_hours: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_requests_for_visibility: 3,
            request_timeout_hours: 24,
        }
    }
}
