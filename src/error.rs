//! Error types for the welfare matching service

use thiserror::Error;

/// Result type alias for compass operations
pub type Result<T> = std::result::Result<T, CompassError>;

#[derive(Error, Debug)]
pub enum CompassError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Program catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Profile extraction error: {0}")]
    ExtractionError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
