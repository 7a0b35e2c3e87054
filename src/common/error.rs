//! Error types for the request chain runner
//!
//! Configuration defects abort a run before any request is sent, so every
//! variant here is fatal. Per-step runtime failures live in
//! [`crate::testing::StepError`] and never surface through this type.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the request chain runner
#[derive(Error, Debug)]
pub enum Error {
    // === Suite Errors ===
    #[error("Test configuration file {0} not found")]
    SuiteNotFound(String),

    #[error("Invalid test configuration file {path}: {reason}")]
    SuiteParse { path: String, reason: String },

    /// A step failed validation; `field` is a path such as `assume[0].got`
    #[error("Invalid step {step}: {field}: {message}")]
    InvalidStep {
        step: String,
        field: String,
        message: String,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Report Errors ===
    #[error("Failed to write report to '{path}': {error}")]
    Report { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid step error
    pub fn invalid_step(step: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidStep {
            step: step.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a suite parse error
    pub fn suite_parse(path: &str, reason: impl ToString) -> Self {
        Self::SuiteParse {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from step validation
    pub fn is_invalid_step(&self) -> bool {
        matches!(self, Self::InvalidStep { .. })
    }
}
