//! The contract shared by the three report sections.

use crate::moderation::FreeTextField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The wizard's sections, in the order they're filled out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Compensation,
    Assignment,
    Staffing,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Compensation,
        SectionKind::Assignment,
        SectionKind::Staffing,
    ];

    /// Route segment, e.g. `/report/full-report/compensation`
    pub fn path_segment(&self) -> &'static str {
        match self {
            SectionKind::Compensation => "compensation",
            SectionKind::Assignment => "assignment",
            SectionKind::Staffing => "staffing",
        }
    }

    pub fn next(&self) -> Option<SectionKind> {
        match self {
            SectionKind::Compensation => Some(SectionKind::Assignment),
            SectionKind::Assignment => Some(SectionKind::Staffing),
            SectionKind::Staffing => None,
        }
    }

    pub fn previous(&self) -> Option<SectionKind> {
        match self {
            SectionKind::Compensation => None,
            SectionKind::Assignment => Some(SectionKind::Compensation),
            SectionKind::Staffing => Some(SectionKind::Assignment),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A field-level problem shown inline next to the field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A section of the report wizard
pub trait ReportSection {
    fn kind(&self) -> SectionKind;

    /// Completion percentage, 0 to 100
    fn progress(&self) -> u8;

    /// Values that were entered but break a rule. Missing answers are not
    /// errors; they only hold progress back.
    fn validate(&self) -> Vec<FieldError>;

    /// Non-empty free text in this section, for moderation
    fn free_text(&self) -> Vec<(FreeTextField, String)>;

    fn can_advance(&self) -> bool {
        self.progress() == 100 && self.validate().is_empty()
    }
}

/// Shared comment rule: at most the allowed number of characters
pub(crate) fn comment_error(field: &'static str, comment: &str) -> Option<FieldError> {
    (super::fields::comment_chars_left(comment) < 0)
        .then(|| FieldError::new(field, "Length of comment exceeds 1000 characters."))
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
