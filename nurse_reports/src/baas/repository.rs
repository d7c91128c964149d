//! Repository trait definitions for testability and dependency injection.
//!
//! Every call carries the end user's access token; row-level security on the
//! backend scopes what each token can read and write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::BaasResult;
use crate::auth::Session;
use crate::feedback::FeedbackEntry;
use crate::moderation::ModerationResult;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::report::{Departments, Hospital, Report};

/// The hosted auth service
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a session
    async fn password_grant(&self, email: &str, password: &str) -> BaasResult<Session>;

    /// Register an account; the provider sends a confirmation email
    async fn signup(&self, email: &str, password: &str) -> BaasResult<()>;

    /// Exchange a refresh token for a new session
    async fn refresh(&self, access_token: &str, refresh_token: &str) -> BaasResult<Session>;

    /// URL that starts an SSO login with `provider`
    fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String;

    /// Revoke the session server-side
    async fn logout(&self, access_token: &str) -> BaasResult<()>;
}

/// The users table
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// The caller's profile row, if created
    ///
    /// # Errors
    ///
    /// `BaasError::TooManyRows` if more than one row matches the user.
    async fn get_profile(&self, token: &str, user_id: &str) -> BaasResult<Option<UserProfile>>;

    /// Insert a row with backend defaults
    async fn create_profile(&self, token: &str, user_id: &str) -> BaasResult<()>;

    /// Just the `modified_at` column
    async fn get_modified_at(&self, token: &str, user_id: &str) -> BaasResult<Option<DateTime<Utc>>>;

    async fn update_profile(&self, token: &str, user_id: &str, update: &ProfileUpdate) -> BaasResult<()>;
}

/// The reports table
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn report_exists(&self, token: &str, report_id: Uuid) -> BaasResult<bool>;

    async fn get_report(&self, token: &str, report_id: Uuid) -> BaasResult<Option<Report>>;

    /// A report by `user_id` for the same hospital and placement submitted
    /// at or after `since`
    async fn find_recent_report(
        &self,
        token: &str,
        user_id: &str,
        hospital_id: &str,
        placement_key: &str,
        since: DateTime<Utc>,
    ) -> BaasResult<Option<Report>>;

    async fn insert_report(&self, token: &str, report: &Report) -> BaasResult<()>;

    /// Overwrite an existing report in place
    async fn replace_report(&self, token: &str, report: &Report) -> BaasResult<()>;

    /// Write the `<field>_flag` columns
    async fn patch_flags(&self, token: &str, report_id: Uuid, flags: &ModerationResult) -> BaasResult<()>;
}

/// The hospitals table
#[async_trait]
pub trait HospitalRepository: Send + Sync {
    async fn get_hospital(&self, token: &str, hospital_id: &str) -> BaasResult<Option<Hospital>>;

    async fn update_departments(
        &self,
        token: &str,
        hospital_id: &str,
        departments: &Departments,
    ) -> BaasResult<()>;
}

/// The feedback table
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Entries by `user_id` created at or after `since`
    async fn count_recent(&self, token: &str, user_id: &str, since: DateTime<Utc>) -> BaasResult<usize>;

    async fn insert_feedback(&self, token: &str, entry: &FeedbackEntry) -> BaasResult<()>;
}
