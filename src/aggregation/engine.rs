use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::domain::{AggregationConfig, MessageId, NoteRequest, RequestAggregation};
use super::repository::{AggregationRepository, RequestStore, StoreError};
use crate::events::{DomainEvent, EventPublisher, PublishError};
use crate::scoring::UserId;

/// Retries against optimistic-concurrency conflicts before a message's
/// recomputation is surfaced as fatal.
const MAX_RECOMPUTE_RETRIES: u32 = 3;

/// Failure surfaced by the aggregation engine. Always scoped to a single
/// message; callers isolate per message rather than aborting a sweep.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("concurrent updates on message {0} exhausted retries")]
    ConcurrentUpdate(String),
    #[error("no requests or aggregation recorded for message {0}")]
    UnknownMessage(String),
    #[error("message {0} has not met the request threshold")]
    NotEligible(String),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Result of one expiry sweep. Per-message failures are reported alongside
/// the rows that recomputed cleanly instead of aborting the sweep.
#[derive(Debug, Default)]
pub struct ExpirySweep {
    pub recomputed: Vec<RequestAggregation>,
    pub failures: Vec<(MessageId, AggregationError)>,
}

/// Per-message threshold state machine over the authoritative request store.
///
/// States per message: no aggregation → below threshold → threshold met
/// (unnotified) → threshold met (notified). Counts are recomputed from the
/// store on every event; the threshold latch is set exactly once per
/// accumulation cycle and survives later count regressions.
///
/// Same-message operations serialize on a per-message mutex so the latch
/// cannot be lost to a race; different messages proceed independently.
pub struct RequestAggregationEngine<S, R, P> {
    requests: Arc<S>,
    aggregations: Arc<R>,
    publisher: Arc<P>,
    config: AggregationConfig,
    locks: Mutex<HashMap<MessageId, Arc<Mutex<()>>>>,
}

impl<S, R, P> RequestAggregationEngine<S, R, P>
where
    S: RequestStore,
    R: AggregationRepository,
    P: EventPublisher,
{
    pub fn new(
        requests: Arc<S>,
        aggregations: Arc<R>,
        publisher: Arc<P>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            requests,
            aggregations,
            publisher,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Record (or refresh) one user's request and recompute the message's
    /// aggregation, returning the updated row.
    pub fn record_request(
        &self,
        request: NoteRequest,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let message_id = request.message_id.clone();
        let lock = self.lock_for(&message_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.requests.record(request)?;
        self.recompute_with_retry(&message_id, now)
    }

    /// Deactivate one user's request and recompute. The latch survives even
    /// if the count drops back below the threshold.
    pub fn withdraw_request(
        &self,
        message_id: &MessageId,
        requestor_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let lock = self.lock_for(message_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.requests.withdraw(message_id, requestor_id)?;
        self.recompute_with_retry(message_id, now)
    }

    /// Recompute one message's aggregation from the authoritative request
    /// list. Either completes fully, latch evaluation included, or fails
    /// without touching the persisted row.
    pub fn recompute(
        &self,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let lock = self.lock_for(message_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.recompute_with_retry(message_id, now)
    }

    /// Mark a threshold-met message as notified. Idempotent: repeated calls
    /// after the first are no-ops and emit nothing.
    pub fn mark_notified(
        &self,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let lock = self.lock_for(message_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut row = self
            .aggregations
            .fetch(message_id)?
            .ok_or_else(|| AggregationError::UnknownMessage(message_id.0.clone()))?;

        if !row.threshold_met {
            return Err(AggregationError::NotEligible(message_id.0.clone()));
        }
        if row.contributors_notified {
            return Ok(row);
        }

        row.contributors_notified = true;
        row.notified_at = Some(now);
        self.aggregations.upsert(row.clone())?;

        self.publisher.publish(DomainEvent::ContributorsNotified {
            message_id: row.message_id.clone(),
            server_id: row.server_id.clone(),
        })?;

        Ok(row)
    }

    /// Open a fresh accumulation window for a message, clearing the latch
    /// and notification marker.
    pub fn reset_cycle(
        &self,
        message_id: &MessageId,
    ) -> Result<RequestAggregation, AggregationError> {
        let lock = self.lock_for(message_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut row = self
            .aggregations
            .fetch(message_id)?
            .ok_or_else(|| AggregationError::UnknownMessage(message_id.0.clone()))?;

        row.reset_cycle();
        self.aggregations.upsert(row.clone())?;
        info!(message_id = %row.message_id.0, "aggregation cycle reset");
        Ok(row)
    }

    /// Deactivate requests older than the configured timeout and recompute
    /// every touched message. Per-message failures are collected, not fatal
    /// to the sweep.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> Result<ExpirySweep, AggregationError> {
        let cutoff = now - Duration::hours(self.config.request_timeout_hours);
        let touched = self.requests.deactivate_older_than(cutoff)?;

        let mut sweep = ExpirySweep::default();
        for message_id in touched {
            match self.recompute(&message_id, now) {
                Ok(row) => sweep.recomputed.push(row),
                Err(err) => {
                    warn!(message_id = %message_id.0, error = %err, "expiry recompute failed");
                    sweep.failures.push((message_id, err));
                }
            }
        }
        Ok(sweep)
    }

    fn lock_for(&self, message_id: &MessageId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(message_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Caller must hold the message lock.
    fn recompute_with_retry(
        &self,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let mut attempts = 0;
        loop {
            match self.recompute_once(message_id, now) {
                Err(AggregationError::Store(StoreError::Conflict)) => {
                    attempts += 1;
                    if attempts >= MAX_RECOMPUTE_RETRIES {
                        return Err(AggregationError::ConcurrentUpdate(message_id.0.clone()));
                    }
                }
                other => return other,
            }
        }
    }

    fn recompute_once(
        &self,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<RequestAggregation, AggregationError> {
        let active = self.requests.active_requests(message_id)?;
        let existing = self.aggregations.fetch(message_id)?;

        let mut row = match (existing, active.first()) {
            (Some(row), _) => row,
            (None, Some(first)) => {
                RequestAggregation::new(message_id.clone(), first.server_id.clone())
            }
            (None, None) => {
                return Err(AggregationError::UnknownMessage(message_id.0.clone()));
            }
        };

        row.total_requests = active.len() as u32;
        row.unique_requestors = active
            .iter()
            .map(|request| &request.requestor_id)
            .collect::<HashSet<_>>()
            .len() as u32;

        let earliest = active.iter().map(|request| request.timestamp).min();
        let latest = active.iter().map(|request| request.timestamp).max();
        if row.first_request_at.is_none() {
            row.first_request_at = earliest;
        }
        if latest.is_some() {
            row.last_request_at = latest;
        }

        let crossed = !row.threshold_met
            && row.total_requests >= self.config.min_requests_for_visibility;
        if crossed {
            row.threshold_met = true;
            row.threshold_met_at = Some(now);
        }

        self.aggregations.upsert(row.clone())?;

        if crossed {
            info!(
                message_id = %row.message_id.0,
                total_requests = row.total_requests,
                unique_requestors = row.unique_requestors,
                "request threshold met"
            );
            self.publisher.publish(DomainEvent::ThresholdMet {
                message_id: row.message_id.clone(),
                server_id: row.server_id.clone(),
                total_requests: row.total_requests,
                unique_requestors: row.unique_requestors,
            })?;
        }

        Ok(row)
    }
}
