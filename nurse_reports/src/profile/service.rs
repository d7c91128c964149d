//! Profile loading and updates.

use super::errors::{ProfileError, ProfileResult};
use super::models::{ProfileUpdate, UserProfile};
use crate::baas::UserRepository;
use crate::clock::Clock;
use std::sync::Arc;
use uuid::Uuid;

/// Loads, creates and updates the caller's row in the users table
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Load the user's profile, creating it on first login.
    ///
    /// # Errors
    ///
    /// - `ProfileError::DuplicateUser` if several rows match
    /// - `ProfileError::ReadAfterCreate` if the row is still missing after creating it
    /// - `ProfileError::Storage` on backend failure
    pub async fn load_or_create(&self, token: &str, user_id: &str) -> ProfileResult<UserProfile> {
        if let Some(profile) = self.users.get_profile(token, user_id).await? {
            return Ok(profile);
        }

        tracing::info!(user_id = user_id, "Creating profile for first login");
        self.users.create_profile(token, user_id).await?;

        match self.users.get_profile(token, user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::error!(user_id = user_id, "Profile missing right after creation");
                Err(ProfileError::ReadAfterCreate)
            }
        }
    }

    /// Reload the profile if the stored row changed since `cached` was read.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(profile))` - the row changed; fresh copy
    /// * `Ok(None)` - `cached` is current
    pub async fn refresh_if_modified(&self, token: &str, cached: &UserProfile) -> ProfileResult<Option<UserProfile>> {
        let modified_at = self.users.get_modified_at(token, &cached.user_id).await?;
        match modified_at {
            Some(at) if at == cached.modified_at => Ok(None),
            _ => {
                tracing::debug!(user_id = %cached.user_id, "Profile changed, reloading");
                self.load_or_create(token, &cached.user_id).await.map(Some)
            }
        }
    }

    pub async fn save_hospital(&self, token: &str, profile: &UserProfile, hospital_id: &str) -> ProfileResult<UserProfile> {
        if profile.saved_hospital_ids.contains(hospital_id) {
            return Ok(profile.clone());
        }
        let mut saved = profile.saved_hospital_ids.clone();
        saved.insert(hospital_id.to_string());

        let mut update = ProfileUpdate::new(self.clock.now());
        update.saved_hospital_ids = Some(saved);
        self.apply(token, profile, update).await
    }

    pub async fn unsave_hospital(&self, token: &str, profile: &UserProfile, hospital_id: &str) -> ProfileResult<UserProfile> {
        if !profile.saved_hospital_ids.contains(hospital_id) {
            return Ok(profile.clone());
        }
        let mut saved = profile.saved_hospital_ids.clone();
        saved.remove(hospital_id);

        let mut update = ProfileUpdate::new(self.clock.now());
        update.saved_hospital_ids = Some(saved);
        self.apply(token, profile, update).await
    }

    /// Record an accepted report: add its id, save its hospital, and clear
    /// the onboarding flag if this was the first one.
    pub async fn record_report(
        &self,
        token: &str,
        profile: &UserProfile,
        report_id: Uuid,
        hospital_id: &str,
    ) -> ProfileResult<UserProfile> {
        let mut update = ProfileUpdate::new(self.clock.now());

        let mut reports = profile.report_ids.clone();
        reports.insert(report_id);
        update.report_ids = Some(reports);

        let mut saved = profile.saved_hospital_ids.clone();
        if saved.insert(hospital_id.to_string()) {
            update.saved_hospital_ids = Some(saved);
        }

        if profile.needs_onboarding {
            tracing::info!(user_id = %profile.user_id, "First report accepted, onboarding complete");
            update.needs_onboarding = Some(false);
        }

        self.apply(token, profile, update).await
    }

    async fn apply(&self, token: &str, profile: &UserProfile, update: ProfileUpdate) -> ProfileResult<UserProfile> {
        self.users.update_profile(token, &profile.user_id, &update).await?;
        Ok(update.apply_to(profile))
    }
}
