use chrono::{DateTime, Utc};

use super::domain::{MessageId, NoteRequest, RequestAggregation};
use crate::scoring::UserId;

/// Authoritative note-request store. The engine never trusts cached counts;
/// every recomputation reads the active list through this trait.
pub trait RequestStore: Send + Sync {
    /// Active requests for one message, one per requestor.
    fn active_requests(&self, message_id: &MessageId) -> Result<Vec<NoteRequest>, StoreError>;

    /// Insert or reactivate a request. Re-requesting from the same user
    /// replaces the prior record rather than duplicating it.
    fn record(&self, request: NoteRequest) -> Result<(), StoreError>;

    /// Deactivate one user's request for a message. Unknown pairs are a
    /// no-op.
    fn withdraw(&self, message_id: &MessageId, requestor_id: &UserId) -> Result<(), StoreError>;

    /// Bulk-deactivate requests older than the cutoff, returning the
    /// distinct messages that lost at least one request.
    fn deactivate_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<MessageId>, StoreError>;
}

/// Persisted aggregation rows, keyed by message.
pub trait AggregationRepository: Send + Sync {
    fn fetch(&self, message_id: &MessageId) -> Result<Option<RequestAggregation>, StoreError>;

    /// Write the full row. Implementations backed by optimistic concurrency
    /// return [`StoreError::Conflict`] when a competing writer won; the
    /// engine retries a bounded number of times.
    fn upsert(&self, aggregation: RequestAggregation) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("concurrent writer updated the row first")]
    Conflict,
}
