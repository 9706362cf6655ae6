//! Error types for the KYC orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, KycError>;

#[derive(Error, Debug)]
pub enum KycError {

    // =============================
    // Pipeline Stage Errors
    // =============================

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Unknown form type: {0}")]
    UnknownFormType(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // Request / Configuration Errors
    // =============================

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
