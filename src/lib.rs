//! Scoring and request-aggregation core for a community notes service.
//!
//! Two subsystems live here: the contributor helpfulness calculator (pure
//! per-user trust scoring from rating histories) and the request aggregation
//! engine (per-message threshold state machine deciding when enough users
//! have flagged a message to notify contributors). Everything else — Discord
//! surfaces, persistence, transports — stays behind the repository and
//! publisher traits.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod events;
pub mod scoring;
pub mod telemetry;
pub mod worker;

pub use aggregation::{
    AggregationConfig, AggregationError, AggregationRepository, ExpirySweep, MessageId,
    NoteRequest, RequestAggregation, RequestAggregationEngine, RequestStore, ServerId, StoreError,
};
pub use config::AppConfig;
pub use error::AppError;
pub use events::{DomainEvent, EventPublisher, PublishError};
pub use scoring::{
    BatchOutcome, HelpfulnessCalculator, HelpfulnessMetrics, NoteId, NoteStatus, RatingData,
    ScoringError, ScoringOrchestrator, ScoringWeights, TrustLevel, UserId, UserScore,
    UserScoringData,
};
pub use worker::{
    ScoreSink, ScoringSnapshot, ScoringWorker, SinkError, SnapshotError, SnapshotSource,
    WorkerConfig, WorkerError,
};
