use thiserror::Error;

/// Custom error types for thought-chain
#[derive(Error, Debug)]
pub enum ThoughtChainError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Reasoning engine failure: {0}")]
    Engine(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid action: {0}")]
    InvalidState(String),
}

impl ThoughtChainError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ThoughtChainError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ThoughtChainError>;
