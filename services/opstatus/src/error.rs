//! Error types for the opstatus service

/// Errors that can occur in the opstatus service
#[derive(Debug, thiserror::Error)]
pub enum OpStatusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session store error: {0}")]
    Session(String),
}

/// Result type alias for opstatus operations
pub type Result<T> = std::result::Result<T, OpStatusError>;
