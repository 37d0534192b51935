use std::env;
use std::fmt;

use crate::workflows::honors::{EvaluationOptions, MissingGradePolicy, TierSelection};

const DEFAULT_WORKERS: usize = 4;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let workers = match env::var("HONOR_WORKERS") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidWorkers),
            },
            Err(_) => DEFAULT_WORKERS,
        };

        let missing_grades = match env::var("HONOR_MISSING_GRADES") {
            Ok(raw) => raw
                .parse::<MissingGradePolicy>()
                .map_err(|_| ConfigError::InvalidMissingGradePolicy { value: raw })?,
            Err(_) => MissingGradePolicy::default(),
        };

        let tier_selection = match env::var("HONOR_TIER_SELECTION") {
            Ok(raw) => raw
                .parse::<TierSelection>()
                .map_err(|_| ConfigError::InvalidTierSelection { value: raw })?,
            Err(_) => TierSelection::default(),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            engine: EngineConfig {
                workers,
                options: EvaluationOptions {
                    missing_grades,
                    tier_selection,
                },
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Batch sizing and rule-evaluation switches.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub workers: usize,
    pub options: EvaluationOptions,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWorkers,
    InvalidMissingGradePolicy { value: String },
    InvalidTierSelection { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWorkers => write!(f, "HONOR_WORKERS must be a positive integer"),
            ConfigError::InvalidMissingGradePolicy { value } => write!(
                f,
                "HONOR_MISSING_GRADES must be 'exclude' or 'disqualify' (found '{}')",
                value
            ),
            ConfigError::InvalidTierSelection { value } => write!(
                f,
                "HONOR_TIER_SELECTION must be 'most_stringent' or 'configured_order' (found '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
