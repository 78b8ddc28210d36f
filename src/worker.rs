//! Periodic batch driver. An interval loop stands in for the original
//! deployment's cron schedule; each tick pulls a frozen snapshot, runs the
//! batch, and hands the scores to the persistence sink. Nothing here may
//! crash the host process; tick failures are logged and the loop continues.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::aggregation::engine::AggregationError;
use crate::aggregation::repository::{AggregationRepository, RequestStore};
use crate::aggregation::ExpirySweep;
use crate::events::EventPublisher;
use crate::scoring::{
    NoteId, NoteStatus, RatingData, ScoringOrchestrator, UserId, UserScore, UserScoringData,
};

/// Scheduling dials for the background worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub scoring_interval_secs: u64,
    pub expiry_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Production runs the scoring pass every six hours.
            scoring_interval_secs: 6 * 60 * 60,
            expiry_interval_secs: 60 * 60,
        }
    }
}

/// Frozen input for one scoring pass: the user population, the complete
/// rating set, and the note-status lookup, all captured at the same instant.
#[derive(Debug, Clone, Default)]
pub struct ScoringSnapshot {
    pub users: Vec<UserScoringData>,
    pub ratings: Vec<RatingData>,
    pub note_statuses: HashMap<NoteId, NoteStatus>,
}

/// Input-feed boundary: whatever store holds users, ratings, and note
/// statuses supplies a consistent snapshot per pass.
pub trait SnapshotSource: Send + Sync {
    fn scoring_snapshot(&self) -> Result<ScoringSnapshot, SnapshotError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for computed scores.
pub trait ScoreSink: Send + Sync {
    fn persist(&self, scores: &HashMap<UserId, UserScore>) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("score sink unavailable: {0}")]
    Unavailable(String),
}

/// Error raised by one worker tick.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Background driver owning the orchestrator plus the snapshot and sink
/// boundaries.
pub struct ScoringWorker<S, R, P, F, K> {
    orchestrator: Arc<ScoringOrchestrator<S, R, P>>,
    source: Arc<F>,
    sink: Arc<K>,
    config: WorkerConfig,
}

impl<S, R, P, F, K> ScoringWorker<S, R, P, F, K>
where
    S: RequestStore,
    R: AggregationRepository,
    P: EventPublisher,
    F: SnapshotSource,
    K: ScoreSink,
{
    pub fn new(
        orchestrator: Arc<ScoringOrchestrator<S, R, P>>,
        source: Arc<F>,
        sink: Arc<K>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            orchestrator,
            source,
            sink,
            config,
        }
    }

    /// Run one full scoring pass immediately, returning the number of users
    /// scored. Per-user failures inside the batch are already isolated; only
    /// snapshot or sink failures abort the tick.
    pub fn run_scoring_pass(&self) -> Result<usize, WorkerError> {
        let snapshot = self.source.scoring_snapshot()?;
        let outcome = self.orchestrator.batch_calculate_helpfulness(
            &snapshot.users,
            &snapshot.ratings,
            &snapshot.note_statuses,
            Utc::now(),
        );

        for (user_id, error) in &outcome.failures {
            warn!(user_id = %user_id.0, error = %error, "user skipped in scoring pass");
        }

        let scored = outcome.scores.len();
        self.sink.persist(&outcome.scores)?;
        Ok(scored)
    }

    /// Run one expiry sweep immediately.
    pub fn run_expiry_sweep(&self) -> Result<ExpirySweep, WorkerError> {
        Ok(self
            .orchestrator
            .aggregation_engine()
            .expire_stale(Utc::now())?)
    }

    /// Drive both periodic loops until the task is dropped or aborted.
    pub async fn run(&self) {
        if !self.config.enabled {
            info!("scoring worker disabled, not scheduling passes");
            return;
        }

        let mut scoring_tick =
            tokio::time::interval(Duration::from_secs(self.config.scoring_interval_secs.max(1)));
        let mut expiry_tick =
            tokio::time::interval(Duration::from_secs(self.config.expiry_interval_secs.max(1)));
        // Skip the immediate first firing of both intervals.
        scoring_tick.tick().await;
        expiry_tick.tick().await;

        info!(
            scoring_interval_secs = self.config.scoring_interval_secs,
            expiry_interval_secs = self.config.expiry_interval_secs,
            "scoring worker started"
        );

        loop {
            tokio::select! {
                _ = scoring_tick.tick() => match self.run_scoring_pass() {
                    Ok(scored) => info!(scored, "scheduled scoring pass complete"),
                    Err(error) => warn!(error = %error, "scheduled scoring pass failed"),
                },
                _ = expiry_tick.tick() => match self.run_expiry_sweep() {
                    Ok(sweep) => {
                        if !sweep.recomputed.is_empty() || !sweep.failures.is_empty() {
                            info!(
                                recomputed = sweep.recomputed.len(),
                                failures = sweep.failures.len(),
                                "expiry sweep complete"
                            );
                        }
                    }
                    Err(error) => warn!(error = %error, "expiry sweep failed"),
                },
            }
        }
    }
}
