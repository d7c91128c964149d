//! User profile data models.

use crate::report::models::null_as_default;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    #[default]
    Free,
    Pro,
}

/// Row of the users table.
///
/// `needs_onboarding` is false iff the user has at least one accepted report
/// (or was exempted by an admin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(rename = "license", default)]
    pub license_type: Option<String>,
    #[serde(default)]
    pub license_state: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub membership: Membership,
    #[serde(rename = "needs_onboard", default = "default_true")]
    pub needs_onboarding: bool,
    #[serde(rename = "trust", default, deserialize_with = "null_as_default")]
    pub trust_level: i32,
    #[serde(rename = "saved_hospitals", default, deserialize_with = "null_as_default")]
    pub saved_hospital_ids: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub report_ids: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl UserProfile {
    pub fn has_reported(&self) -> bool {
        !self.needs_onboarding
    }
}

/// Partial update for a users row; unset fields are left alone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "needs_onboard", skip_serializing_if = "Option::is_none")]
    pub needs_onboarding: Option<bool>,
    #[serde(rename = "saved_hospitals", skip_serializing_if = "Option::is_none")]
    pub saved_hospital_ids: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_ids: Option<BTreeSet<Uuid>>,
    pub modified_at: DateTime<Utc>,
}

impl ProfileUpdate {
    pub fn new(modified_at: DateTime<Utc>) -> Self {
        Self {
            needs_onboarding: None,
            saved_hospital_ids: None,
            report_ids: None,
            modified_at,
        }
    }

    /// The profile as it reads after this update is stored
    pub fn apply_to(&self, profile: &UserProfile) -> UserProfile {
        let mut updated = profile.clone();
        if let Some(needs_onboarding) = self.needs_onboarding {
            updated.needs_onboarding = needs_onboarding;
        }
        if let Some(saved) = &self.saved_hospital_ids {
            updated.saved_hospital_ids = saved.clone();
        }
        if let Some(reports) = &self.report_ids {
            updated.report_ids = reports.clone();
        }
        updated.modified_at = self.modified_at;
        updated
    }
}
