use crate::aggregation::AggregationError;
use crate::config::ConfigError;
use crate::scoring::ScoringError;
use crate::telemetry::TelemetryError;
use crate::worker::WorkerError;
use std::fmt;

/// Top-level error for hosts embedding the scoring core.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Scoring(ScoringError),
    Aggregation(AggregationError),
    Worker(WorkerError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Aggregation(err) => write!(f, "aggregation error: {}", err),
            AppError::Worker(err) => write!(f, "worker error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Aggregation(err) => Some(err),
            AppError::Worker(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<AggregationError> for AppError {
    fn from(value: AggregationError) -> Self {
        Self::Aggregation(value)
    }
}

impl From<WorkerError> for AppError {
    fn from(value: WorkerError) -> Self {
        Self::Worker(value)
    }
}
