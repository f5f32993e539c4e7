//! Shared error type for the client foundation.

use thiserror::Error;

/// Error type for configuration and path operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Path resolution error
    #[error("Path error: {0}")]
    Path(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
