//! Page access decisions.

use super::claims::ClaimsResult;
use crate::profile::UserProfile;

/// What a page requires of the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Public page
    None,
    /// Any valid session
    LoggedIn,
    /// Valid session and at least one accepted report
    ReportSubmitted,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 3] = [
        AccessLevel::None,
        AccessLevel::LoggedIn,
        AccessLevel::ReportSubmitted,
    ];
}

/// Why a visitor was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// No valid session
    Login,
    /// Logged in but hasn't submitted a report yet
    Report,
}

impl DenyReason {
    pub fn redirect_target(&self) -> &'static str {
        match self {
            DenyReason::Login => "/",
            DenyReason::Report => "/onboard",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::Login => "You must be logged in to access that content.",
            DenyReason::Report => "Please submit a report before accessing that content.",
        }
    }
}

/// Decide whether a visitor may see a page.
///
/// A valid session whose profile hasn't been loaded counts as still needing
/// onboarding.
///
/// | level           | no valid session | needs onboarding | has reported |
/// |-----------------|------------------|------------------|--------------|
/// | None            | allow            | allow            | allow        |
/// | LoggedIn        | Login            | allow            | allow        |
/// | ReportSubmitted | Login            | Report           | allow        |
pub fn check(level: AccessLevel, claims: &ClaimsResult, profile: Option<&UserProfile>) -> Result<(), DenyReason> {
    match level {
        AccessLevel::None => Ok(()),
        AccessLevel::LoggedIn if claims.is_valid() => Ok(()),
        AccessLevel::LoggedIn => Err(DenyReason::Login),
        AccessLevel::ReportSubmitted if !claims.is_valid() => Err(DenyReason::Login),
        AccessLevel::ReportSubmitted => {
            if profile.is_some_and(UserProfile::has_reported) {
                Ok(())
            } else {
                Err(DenyReason::Report)
            }
        }
    }
}
