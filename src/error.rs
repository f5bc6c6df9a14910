//! Error types for the focus engine

use thiserror::Error;

/// Errors that abort an engine call.
///
/// Conditions such as an empty batch are not errors: they come back as
/// well-formed results carrying an `error` field.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Summarizer backend failed: {0}")]
    SummarizerError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
