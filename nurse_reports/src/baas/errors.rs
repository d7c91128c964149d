//! Error types for calls to the hosted backend.

use std::time::Duration;
use thiserror::Error;

/// Errors from the REST/auth provider
#[derive(Debug, Error)]
pub enum BaasError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `message` is the provider's error text when present
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A lookup keyed on a unique column returned several rows
    #[error("Expected at most one row, got {0}")]
    TooManyRows(usize),
}

impl BaasError {
    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            BaasError::Http(_) | BaasError::Timeout(_) => true,
            BaasError::Status { status, .. } => *status == 429 || *status >= 500,
            BaasError::Decode(_) | BaasError::TooManyRows(_) => false,
        }
    }

    /// Get a client-safe error message that doesn't leak request details
    pub fn client_message(&self) -> String {
        match self {
            BaasError::Timeout(_) => "The server took too long to respond. Please try again.".to_string(),
            BaasError::Http(_) => "Unable to reach the server. Please try again.".to_string(),
            _ => crate::GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result type for backend calls
pub type BaasResult<T> = Result<T, BaasError>;
