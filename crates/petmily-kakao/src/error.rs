//! External login error types.

use thiserror::Error;

/// External login error type.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The Kakao app key is not configured
    #[error("Kakao app key is not configured; set PETMILY_KAKAO_APP_KEY")]
    MissingAppKey,

    /// The provider reported a failure or the user cancelled
    #[error("Kakao authorization failed: {0}")]
    Provider(String),

    /// The callback's state parameter did not match the request
    #[error("Authorization state parameter mismatch")]
    StateMismatch,

    /// Redirect parameters were missing or malformed
    #[error("Malformed redirect parameters: {0}")]
    MalformedRedirect(String),

    /// No callback arrived in time
    #[error("Authorization timed out")]
    Timeout,

    /// Backend call failed; carries the middleware-annotated message
    #[error("{0}")]
    Api(#[from] petmily_api::ApiError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] petmily_storage::StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
