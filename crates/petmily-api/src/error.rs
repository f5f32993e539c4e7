//! API error types and the status-to-message table.

use crate::ErrorEnvelope;
use thiserror::Error;

/// Resolve the fixed human-readable message for a response status.
///
/// `None` means no HTTP response was obtained at all. Callers display
/// these messages as-is; the table is the only place they are defined.
pub fn message_for_status(status: Option<u16>) -> &'static str {
    match status {
        None => "Cannot reach the server. Check your network connection.",
        Some(400) => "The request was invalid. Please check your input.",
        Some(401) => "Your session has expired. Please log in again.",
        Some(403) => "You do not have permission to do that.",
        Some(404) => "The requested resource was not found.",
        Some(409) => "That conflicts with something that already exists.",
        Some(429) => "Too many requests. Please try again in a moment.",
        Some(500) => "The server ran into a problem. Please try again later.",
        Some(502) => "The server received a bad upstream response.",
        Some(503) => "The service is temporarily unavailable.",
        Some(_) => "Something went wrong. Please try again.",
    }
}

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No HTTP response was obtained.
    #[error("{message}")]
    Network {
        message: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with an error status.
    #[error("{message}")]
    Status {
        status: u16,
        message: &'static str,
        /// Decoded backend error envelope, when one was sent.
        envelope: Option<ErrorEnvelope>,
    },

    /// A success response carried an undecodable body.
    #[error("Malformed response body: {0}")]
    Decode(#[source] reqwest::Error),

    /// Credential storage failed while finishing a response.
    #[error("Storage error: {0}")]
    Storage(#[from] petmily_storage::StorageError),
}

impl ApiError {
    /// Wrap a transport-level failure with its fixed message.
    pub(crate) fn from_transport(source: reqwest::Error) -> Self {
        ApiError::Network {
            message: message_for_status(None),
            source,
        }
    }

    /// The annotated human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. } => message,
            ApiError::Status { message, .. } => message,
            ApiError::Decode(_) => "The server sent an unexpected response.",
            ApiError::Storage(_) => "Local credential storage failed.",
        }
    }

    /// The HTTP status, when a response was obtained.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the authorization failure the global policy acts on.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_table_covers_taxonomy() {
        // One distinct message per error class from the mapping rule
        let statuses = [
            None,
            Some(400),
            Some(401),
            Some(403),
            Some(404),
            Some(409),
            Some(429),
            Some(500),
            Some(502),
            Some(503),
            Some(418),
        ];
        let messages: Vec<&str> = statuses.iter().map(|s| message_for_status(*s)).collect();

        for message in &messages {
            assert!(!message.is_empty());
        }
        let unique: std::collections::HashSet<_> = messages.iter().collect();
        assert_eq!(unique.len(), messages.len());
    }

    #[test]
    fn test_unknown_statuses_share_fallback() {
        assert_eq!(message_for_status(Some(418)), message_for_status(Some(599)));
    }

    #[test]
    fn test_status_error_displays_mapped_message() {
        let err = ApiError::Status {
            status: 403,
            message: message_for_status(Some(403)),
            envelope: None,
        };
        assert_eq!(err.to_string(), "You do not have permission to do that.");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::Status {
            status: 401,
            message: message_for_status(Some(401)),
            envelope: None,
        };
        assert!(err.is_unauthorized());
    }
}
