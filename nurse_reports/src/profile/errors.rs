//! Profile error types.

use crate::baas::BaasError;
use thiserror::Error;

/// Profile errors
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Row still missing right after it was created
    #[error("Profile not found after creation")]
    ReadAfterCreate,

    /// More than one row for a single user id
    #[error("Found {0} profiles for a single user")]
    DuplicateUser(usize),

    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(BaasError),
}

impl From<BaasError> for ProfileError {
    fn from(err: BaasError) -> Self {
        match err {
            BaasError::TooManyRows(count) => ProfileError::DuplicateUser(count),
            other => ProfileError::Storage(other),
        }
    }
}

impl ProfileError {
    pub fn client_message(&self) -> String {
        match self {
            ProfileError::Storage(e) => e.client_message(),
            _ => crate::GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;
