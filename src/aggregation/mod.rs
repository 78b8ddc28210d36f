//! Request aggregation: per-message counts, the visibility threshold latch,
//! and the notification state machine.

pub mod domain;
pub mod engine;
pub mod repository;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{AggregationConfig, MessageId, NoteRequest, RequestAggregation, ServerId};
pub use engine::{AggregationError, ExpirySweep, RequestAggregationEngine};
pub use repository::{AggregationRepository, RequestStore, StoreError};

pub use crate::events::{DomainEvent, EventPublisher, PublishError};
