//! Report wizard and submission error types.

use super::section::{FieldError, SectionKind};
use crate::baas::BaasError;
use thiserror::Error;
use uuid::Uuid;

/// Wizard navigation errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Current section isn't finished
    #[error("The {section} section is {progress}% complete")]
    SectionIncomplete {
        section: SectionKind,
        progress: u8,
        errors: Vec<FieldError>,
    },

    /// Jumping past an unfinished section
    #[error("Finish the {first_incomplete} section before opening {requested}")]
    SectionLocked {
        requested: SectionKind,
        first_incomplete: SectionKind,
    },

    /// `advance` from the last section; submit instead
    #[error("Staffing is the last section")]
    AtFinalSection,

    /// Wizard already submitted
    #[error("Report was already submitted")]
    AlreadySubmitted,

    /// Editing someone else's report
    #[error("Report belongs to another user")]
    NotOwner,
}

impl ReportError {
    pub fn client_message(&self) -> String {
        match self {
            ReportError::SectionIncomplete { errors, .. } if !errors.is_empty() => {
                errors[0].message.clone()
            }
            ReportError::SectionIncomplete { .. } => {
                "Please answer all required questions before continuing.".to_string()
            }
            ReportError::NotOwner => "You can only edit your own reports.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wizard operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Submission errors
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A section isn't finished; the wizard has moved to it
    #[error("The {section} section is incomplete: {message}")]
    Incomplete { section: SectionKind, message: String },

    /// Every generated report id collided with an existing one
    #[error("No unused report id after {attempts} checks")]
    IdSpaceExhausted { attempts: u32 },

    /// Wizard already submitted
    #[error("Report was already submitted")]
    AlreadySubmitted,

    /// Duplicate window can't be subtracted from the current time
    #[error("Duplicate window of {0} is out of range")]
    WindowOutOfRange(chrono::Duration),

    /// Backend failure; the wizard is intact and the submit can be retried
    #[error("Storage error: {0}")]
    Storage(#[from] BaasError),
}

impl SubmitError {
    pub fn client_message(&self) -> String {
        match self {
            SubmitError::Incomplete { message, .. } => message.clone(),
            SubmitError::Storage(_) => "Failed to submit report to database.".to_string(),
            SubmitError::IdSpaceExhausted { .. } | SubmitError::WindowOutOfRange(_) => {
                crate::GENERIC_ERROR_MESSAGE.to_string()
            }
            SubmitError::AlreadySubmitted => self.to_string(),
        }
    }

    /// Whether submitting again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Storage(e) if e.is_retryable())
    }
}

/// Result type for submission
pub type SubmitResult<T> = Result<T, SubmitError>;

/// What a successful submit did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// New report stored
    Submitted {
        report_id: Uuid,
        /// Profile after recording the report; `None` if that update failed
        /// (the report itself is stored)
        profile: Option<crate::profile::UserProfile>,
        profile_synced: bool,
    },
    /// Existing report overwritten
    Edited { report_id: Uuid },
    /// A recent report for the same placement exists; the wizard now edits it
    RedirectToEdit { existing_report_id: Uuid },
}
