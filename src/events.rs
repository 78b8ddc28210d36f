use serde::{Deserialize, Serialize};

use crate::aggregation::domain::{MessageId, ServerId};
use crate::scoring::{TrustLevel, UserId};

/// Domain events the core emits on meaningful state transitions. Subject and
/// topic naming on the wire is the transport collaborator's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A message crossed the request-visibility threshold. Emitted exactly
    /// once per accumulation cycle.
    ThresholdMet {
        message_id: MessageId,
        server_id: ServerId,
        total_requests: u32,
        unique_requestors: u32,
    },
    /// Contributors were notified for a threshold-met message.
    ContributorsNotified {
        message_id: MessageId,
        server_id: ServerId,
    },
    /// A user's recomputed trust level differs from their previous snapshot.
    TrustLevelChanged {
        user_id: UserId,
        previous: TrustLevel,
        current: TrustLevel,
    },
}

/// Outbound event hook (NATS, notification queue, or a test buffer).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent) -> Result<(), PublishError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
