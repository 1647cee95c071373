//! Client error types

use std::time::Duration;

use shared::error::ErrorBody;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied (including closed ordering, blocked address, ...)
    #[error("Permission denied: {}", .0.error)]
    Forbidden(ErrorBody),

    /// Resource not found, or not visible to this restaurant
    #[error("Not found: {}", .0.error)]
    NotFound(ErrorBody),

    /// Validation error
    #[error("Validation error: {}", .0.error)]
    Validation(ErrorBody),

    /// Status change not allowed
    #[error("Conflict: {}", .0.error)]
    Conflict(ErrorBody),

    /// Server-side failure
    #[error("Server error {status}: {}", .body.error)]
    Server { status: u16, body: ErrorBody },

    /// Attempt did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Machine code from the error body, if the server sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Forbidden(body)
            | ClientError::NotFound(body)
            | ClientError::Validation(body)
            | ClientError::Conflict(body)
            | ClientError::Server { body, .. } => body.code.as_deref(),
            _ => None,
        }
    }

    /// Transport failures, timeouts and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Server { status, .. } => *status >= 500,
            ClientError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str) -> ErrorBody {
        ErrorBody {
            error: "x".into(),
            code: Some(code.into()),
            details: None,
        }
    }

    #[test]
    fn only_server_side_failures_retry() {
        assert!(
            ClientError::Server {
                status: 503,
                body: body("NETWORK_ERROR")
            }
            .is_retryable()
        );
        assert!(ClientError::Timeout(Duration::from_secs(15)).is_retryable());
        assert!(!ClientError::NotFound(body("ORDER_NOT_FOUND")).is_retryable());
        assert!(!ClientError::Conflict(body("INVALID_TRANSITION")).is_retryable());
        assert!(!ClientError::Unauthorized.is_retryable());
    }

    #[test]
    fn code_comes_from_body() {
        assert_eq!(
            ClientError::Forbidden(body("ORDERING_CLOSED")).code(),
            Some("ORDERING_CLOSED")
        );
        assert_eq!(ClientError::Unauthorized.code(), None);
    }
}
