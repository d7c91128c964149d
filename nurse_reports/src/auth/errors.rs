//! Authentication error types.

use crate::baas::BaasError;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login form submitted with an empty field
    #[error("Both fields are required.")]
    MissingCredentials,

    /// Signup password and confirmation differ
    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// Email does not look like an address
    #[error("Enter a valid email address.")]
    InvalidEmail,

    /// The auth provider rejected the request; carries its own message
    #[error("{0}")]
    Provider(String),

    /// SSO redirect did not carry both tokens
    #[error("Sign-in redirect is missing session tokens")]
    MalformedRedirect,

    /// Operation needs a session and there is none
    #[error("Not logged in")]
    NotAuthenticated,

    /// Refresh exchange rejected by the provider
    #[error("Refresh token rejected: {0}")]
    RefreshRejected(String),

    /// Transport or decoding failure talking to the provider
    #[error("Backend error: {0}")]
    Backend(#[from] BaasError),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Provider messages are short and meant for end users ("Invalid login
    /// credentials"), so they pass through. Transport errors are sanitized.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Backend(e) => e.client_message(),
            AuthError::RefreshRejected(_) => {
                "Your session could not be renewed. Please log in again.".to_string()
            }
            AuthError::MalformedRedirect => "Sign-in failed. Please try again.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
