//! Gateway error types.
//!
//! These error types represent failures when talking to the persistence
//! backend. Defined in `scormkit-core` so callers can classify errors for
//! retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a persistence gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A stored record could not be decoded into the expected shape.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl GatewayError {
    /// Returns `true` if retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. }
            | GatewayError::Timeout(_)
            | GatewayError::NetworkError(_) => true,
            GatewayError::ApiError { status, .. } => *status >= 500,
            GatewayError::AuthenticationFailed(_)
            | GatewayError::NotFound(_)
            | GatewayError::InvalidRecord(_) => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            GatewayError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
