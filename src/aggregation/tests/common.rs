use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::aggregation::domain::{
    AggregationConfig, MessageId, NoteRequest, RequestAggregation, ServerId,
};
use crate::aggregation::engine::RequestAggregationEngine;
use crate::aggregation::repository::{AggregationRepository, RequestStore, StoreError};
use crate::events::{DomainEvent, EventPublisher, PublishError};
use crate::scoring::UserId;

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid timestamp")
}

pub(crate) fn message(id: &str) -> MessageId {
    MessageId(id.to_string())
}

pub(crate) fn request(message_id: &str, requestor: &str, timestamp: DateTime<Utc>) -> NoteRequest {
    NoteRequest::new(
        message(message_id),
        ServerId("guild-1".to_string()),
        UserId(requestor.to_string()),
        timestamp,
    )
}

/// In-memory request store with injectable read failures.
#[derive(Default)]
pub(crate) struct MemoryRequestStore {
    requests: Mutex<Vec<NoteRequest>>,
    fail_reads: AtomicBool,
}

impl MemoryRequestStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl RequestStore for MemoryRequestStore {
    fn active_requests(&self, message_id: &MessageId) -> Result<Vec<NoteRequest>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("request store offline".to_string()));
        }
        let requests = self.requests.lock().expect("request store poisoned");
        Ok(requests
            .iter()
            .filter(|request| request.is_active && &request.message_id == message_id)
            .cloned()
            .collect())
    }

    fn record(&self, request: NoteRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().expect("request store poisoned");
        requests.retain(|existing| {
            !(existing.message_id == request.message_id
                && existing.requestor_id == request.requestor_id)
        });
        requests.push(request);
        Ok(())
    }

    fn withdraw(&self, message_id: &MessageId, requestor_id: &UserId) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().expect("request store poisoned");
        for existing in requests.iter_mut() {
            if &existing.message_id == message_id && &existing.requestor_id == requestor_id {
                existing.is_active = false;
            }
        }
        Ok(())
    }

    fn deactivate_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<MessageId>, StoreError> {
        let mut requests = self.requests.lock().expect("request store poisoned");
        let mut touched = Vec::new();
        for existing in requests.iter_mut() {
            if existing.is_active && existing.timestamp < cutoff {
                existing.is_active = false;
                if !touched.contains(&existing.message_id) {
                    touched.push(existing.message_id.clone());
                }
            }
        }
        Ok(touched)
    }
}

/// In-memory aggregation row store with injectable upsert conflicts.
#[derive(Default)]
pub(crate) struct MemoryAggregationRepository {
    rows: Mutex<HashMap<MessageId, RequestAggregation>>,
    conflicts_remaining: AtomicU32,
}

impl MemoryAggregationRepository {
    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts_remaining.store(count, Ordering::SeqCst);
    }

    pub fn row(&self, message_id: &MessageId) -> Option<RequestAggregation> {
        self.rows
            .lock()
            .expect("aggregation store poisoned")
            .get(message_id)
            .cloned()
    }
}

impl AggregationRepository for MemoryAggregationRepository {
    fn fetch(&self, message_id: &MessageId) -> Result<Option<RequestAggregation>, StoreError> {
        Ok(self.row(message_id))
    }

    fn upsert(&self, aggregation: RequestAggregation) -> Result<(), StoreError> {
        let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Conflict);
        }
        self.rows
            .lock()
            .expect("aggregation store poisoned")
            .insert(aggregation.message_id.clone(), aggregation);
        Ok(())
    }
}

/// Captures published events for assertions.
#[derive(Default)]
pub(crate) struct MemoryPublisher {
    events: Mutex<Vec<DomainEvent>>,
    fail: AtomicBool,
}

impl MemoryPublisher {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("publisher poisoned").clone()
    }

    pub fn threshold_met_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, DomainEvent::ThresholdMet { .. }))
            .count()
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Transport("event bus offline".to_string()));
        }
        self.events.lock().expect("publisher poisoned").push(event);
        Ok(())
    }
}

pub(crate) type MemoryEngine =
    RequestAggregationEngine<MemoryRequestStore, MemoryAggregationRepository, MemoryPublisher>;

pub(crate) struct EngineHarness {
    pub store: Arc<MemoryRequestStore>,
    pub rows: Arc<MemoryAggregationRepository>,
    pub publisher: Arc<MemoryPublisher>,
    pub engine: Arc<MemoryEngine>,
}

pub(crate) fn harness(config: AggregationConfig) -> EngineHarness {
    let store = Arc::new(MemoryRequestStore::default());
    let rows = Arc::new(MemoryAggregationRepository::default());
    let publisher = Arc::new(MemoryPublisher::default());
    let engine = Arc::new(RequestAggregationEngine::new(
        store.clone(),
        rows.clone(),
        publisher.clone(),
        config,
    ));
    EngineHarness {
        store,
        rows,
        publisher,
        engine,
    }
}
