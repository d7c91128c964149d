//! Moderation error types.

use crate::baas::BaasError;
use std::time::Duration;
use thiserror::Error;

/// Errors from classifying free text or writing the verdict back
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Transport failure talking to the classifier
    #[error("Classifier HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Classifier answered with a non-success status
    #[error("Classifier returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Classifier didn't answer in time
    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    /// Completion content wasn't the requested JSON shape
    #[error("Malformed classifier output: {0}")]
    MalformedResponse(String),

    /// Writing flags or departments failed
    #[error("Storage error: {0}")]
    Storage(#[from] BaasError),
}

impl ModerationError {
    /// Whether classifying again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ModerationError::Http(_) | ModerationError::Timeout(_) => true,
            ModerationError::Status { status, .. } => *status == 429 || *status >= 500,
            ModerationError::MalformedResponse(_) => true,
            ModerationError::Storage(e) => e.is_retryable(),
        }
    }

    /// Moderation runs in the background, so this is only used when an
    /// operator surface shows the failure
    pub fn client_message(&self) -> String {
        crate::GENERIC_ERROR_MESSAGE.to_string()
    }
}

/// Result type for moderation calls
pub type ClassifyResult<T> = Result<T, ModerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ModerationError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(
            ModerationError::Status {
                status: 429,
                message: "slow down".to_string()
            }
            .is_retryable()
        );
        assert!(
            !ModerationError::Status {
                status: 401,
                message: "bad key".to_string()
            }
            .is_retryable()
        );
        assert!(!ModerationError::Storage(BaasError::Decode("x".to_string())).is_retryable());
    }

    #[test]
    fn test_client_message_is_generic() {
        let err = ModerationError::MalformedResponse("{\"oops\": 1}".to_string());
        assert_eq!(err.client_message(), crate::GENERIC_ERROR_MESSAGE);
    }
}
