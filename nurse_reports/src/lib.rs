//! # Nurse Reports
//!
//! Core of a hospital-review platform for nurses: session handling, page
//! access, the three-section report wizard, submission, and background
//! moderation of the free text nurses write.
//!
//! The library holds no request loop. A host web application calls into it
//! on each page load or form event and applies the redirects and messages it
//! returns.
//!
//! ## Core Modules
//!
//! - [`auth`]: token store, claims decoding, proactive refresh, access gate
//! - [`profile`]: the user's row (onboarding flag, saved hospitals, reports)
//! - [`report`]: field types, sections, wizard, submission
//! - [`moderation`]: classifier client and the background dispatcher
//! - [`baas`]: REST and auth client for the hosted backend
//! - [`feedback`], [`email`]: feedback form and outbound mail
//!
//! ## Example
//!
//! ```
//! use nurse_reports::report::{Hospital, ReportWizard, SectionKind, WizardStep};
//! use chrono::Utc;
//!
//! let hospital: Hospital = serde_json::from_value(serde_json::json!({
//!     "hosp_id": "010001",
//!     "hosp_name": "Southeast Health Medical Center",
//! }))
//! .unwrap();
//!
//! let wizard = ReportWizard::new("user-1", &hospital, Utc::now());
//! assert_eq!(wizard.step(), WizardStep::Section(SectionKind::Compensation));
//! assert_eq!(wizard.first_incomplete(), Some(SectionKind::Compensation));
//! ```

/// Session lifecycle and page access.
pub mod auth;

/// Hosted backend client and repository traits.
pub mod baas;

pub mod clock;
pub mod config;
pub mod email;
pub mod feedback;
pub mod logging;

/// Free-text moderation.
pub mod moderation;

pub mod profile;

/// Hospital reports.
pub mod report;

pub use auth::{AccessLevel, ClaimsDecoder, ClaimsResult, PageGuard, Session, TokenStore};
pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use report::{Report, ReportSubmitter, ReportWizard};

/// Shown in place of any error whose detail shouldn't reach the user
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong. If this persists, contact support@nursereports.org.";
