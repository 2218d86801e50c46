//! Error types for the Drive Health Advisor
//!
//! The assessment engine itself never fails: missing telemetry is reported
//! as an "insufficient data" estimate. These errors cover the surrounding
//! system (configuration, diagnostic sources, transport).

use thiserror::Error;

/// Unified error type for the advisor
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid risk thresholds {thresholds:?}: {reason}")]
    InvalidThresholds { thresholds: [u64; 4], reason: String },

    // =========================================================================
    // Diagnostic Source Errors
    // =========================================================================
    #[error("Diagnostic source unavailable: {source_name}")]
    SourceUnavailable { source_name: String },

    #[error("Unable to normalize diagnostics for {device}: {reason}")]
    Normalization { device: String, reason: String },

    #[error("SMART data unavailable for device: {device}")]
    SmartUnavailable { device: String },

    // =========================================================================
    // API Errors
    // =========================================================================
    #[error("API request validation failed: {0}")]
    ApiValidation(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the operator has to fix configuration before this can succeed
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::InvalidThresholds { .. } | Error::YamlParse(_)
        )
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ApiValidation(_) | Error::JsonParse(_) | Error::Normalization { .. }
        )
    }
}

/// Result type alias for the advisor
pub type Result<T> = std::result::Result<T, Error>;
