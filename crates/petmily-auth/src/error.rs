//! Session error types.

use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A login or registration attempt is already in flight
    #[error("Another authentication attempt is already in flight")]
    AttemptInFlight,

    /// The session is already authenticated
    #[error("Already logged in")]
    AlreadyAuthenticated,

    /// Invalid transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Backend call failed; carries the middleware-annotated message
    #[error("{0}")]
    Api(#[from] petmily_api::ApiError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] petmily_storage::StorageError),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_passes_through() {
        let api_err = petmily_api::ApiError::Status {
            status: 403,
            message: petmily_api::message_for_status(Some(403)),
            envelope: None,
        };
        let err = AuthError::from(api_err);

        // The middleware-annotated message is what callers display
        assert_eq!(err.to_string(), "You do not have permission to do that.");
    }
}
