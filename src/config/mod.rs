use std::env;
use std::fmt;

use crate::aggregation::AggregationConfig;
use crate::scoring::ScoringWeights;
use crate::worker::WorkerConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, immutable for a given run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub weights: ScoringWeights,
    pub aggregation: AggregationConfig,
    pub worker: WorkerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            successful_helpful_weight: parse_f64(
                "SCORING_SUCCESSFUL_HELPFUL_WEIGHT",
                defaults.successful_helpful_weight,
            )?,
            successful_not_helpful_weight: parse_f64(
                "SCORING_SUCCESSFUL_NOT_HELPFUL_WEIGHT",
                defaults.successful_not_helpful_weight,
            )?,
            unsuccessful_weight: parse_f64(
                "SCORING_UNSUCCESSFUL_WEIGHT",
                defaults.unsuccessful_weight,
            )?,
            early_rater_weight: parse_f64(
                "SCORING_EARLY_RATER_WEIGHT",
                defaults.early_rater_weight,
            )?,
            note_author_bonus_weight: parse_f64(
                "SCORING_NOTE_AUTHOR_BONUS_WEIGHT",
                defaults.note_author_bonus_weight,
            )?,
            poor_performance_threshold: parse_f64(
                "SCORING_POOR_PERFORMANCE_THRESHOLD",
                defaults.poor_performance_threshold,
            )?,
            newcomer_to_contributor_threshold: parse_f64(
                "SCORING_NEWCOMER_TO_CONTRIBUTOR_THRESHOLD",
                defaults.newcomer_to_contributor_threshold,
            )?,
            contributor_to_trusted_threshold: parse_f64(
                "SCORING_CONTRIBUTOR_TO_TRUSTED_THRESHOLD",
                defaults.contributor_to_trusted_threshold,
            )?,
        };

        let aggregation_defaults = AggregationConfig::default();
        let aggregation = AggregationConfig {
            min_requests_for_visibility: parse_u32(
                "AGGREGATION_MIN_REQUESTS_FOR_VISIBILITY",
                aggregation_defaults.min_requests_for_visibility,
            )?,
            request_timeout_hours: parse_i64(
                "AGGREGATION_REQUEST_TIMEOUT_HOURS",
                aggregation_defaults.request_timeout_hours,
            )?,
        };

        let worker_defaults = WorkerConfig::default();
        let worker = WorkerConfig {
            enabled: parse_bool("WORKER_ENABLED", worker_defaults.enabled)?,
            scoring_interval_secs: parse_u64(
                "WORKER_SCORING_INTERVAL_SECS",
                worker_defaults.scoring_interval_secs,
            )?,
            expiry_interval_secs: parse_u64(
                "WORKER_EXPIRY_INTERVAL_SECS",
                worker_defaults.expiry_interval_secs,
            )?,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            weights,
            aggregation,
            worker,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    InvalidBool { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric, found '{value}'")
            }
            ConfigError::InvalidBool { key, value } => {
                write!(f, "{key} must be a boolean flag, found '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
