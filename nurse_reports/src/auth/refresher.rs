//! Proactive session refresh.

use super::claims::ClaimsResult;
use super::errors::{AuthError, AuthResult};
use super::models::Session;
use super::store::TokenStore;
use crate::baas::{AuthApi, BaasError};
use crate::logging::log_security_event;
use std::sync::Arc;

/// Seconds-to-expiry band in which a valid session is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshWindow {
    pub min_secs: i64,
    pub max_secs: i64,
}

impl Default for RefreshWindow {
    fn default() -> Self {
        Self {
            min_secs: 5,
            max_secs: 1800,
        }
    }
}

impl RefreshWindow {
    pub fn contains(&self, seconds_remaining: i64) -> bool {
        (self.min_secs..=self.max_secs).contains(&seconds_remaining)
    }
}

/// What happens to the stored session when a refresh fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Leave the old tokens in place; the user keeps browsing until expiry
    #[default]
    KeepSession,
    /// Drop the session; the next gate check sends the user to login
    ClearSession,
}

/// Exchanges the refresh token for a new pair shortly before expiry
#[derive(Clone)]
pub struct SessionRefresher {
    api: Arc<dyn AuthApi>,
    window: RefreshWindow,
    on_failure: RefreshFailurePolicy,
}

impl SessionRefresher {
    pub fn new(api: Arc<dyn AuthApi>, window: RefreshWindow, on_failure: RefreshFailurePolicy) -> Self {
        Self {
            api,
            window,
            on_failure,
        }
    }

    pub fn window(&self) -> RefreshWindow {
        self.window
    }

    /// True iff the claims are valid and expiry falls inside the window.
    /// Expired sessions are never refreshed.
    pub fn should_refresh(&self, claims: &ClaimsResult, now: i64) -> bool {
        claims
            .claims()
            .is_some_and(|c| self.window.contains(c.seconds_remaining(now)))
    }

    /// Refresh `session` if the claims call for it.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(session))` - the new token pair
    /// * `Ok(None)` - nothing to do
    ///
    /// # Errors
    ///
    /// `AuthError::RefreshRejected` if the provider refuses the refresh token,
    /// `AuthError::Backend` on transport failure.
    pub async fn maybe_refresh(
        &self,
        claims: &ClaimsResult,
        session: &Session,
        now: i64,
    ) -> AuthResult<Option<Session>> {
        if !self.should_refresh(claims, now) {
            return Ok(None);
        }

        match self.api.refresh(&session.access_token, &session.refresh_token).await {
            Ok(fresh) => {
                tracing::info!(user_id = ?claims.user_id(), "Session refreshed");
                Ok(Some(fresh))
            }
            Err(BaasError::Status { status, message }) if (400..500).contains(&status) => {
                log_security_event("refresh_rejected", claims.user_id(), &message);
                Err(AuthError::RefreshRejected(message))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                Err(AuthError::Backend(e))
            }
        }
    }

    /// Refresh the stored session if needed and write the new pair back.
    ///
    /// On failure the store is handled per the configured
    /// [`RefreshFailurePolicy`] and the error is returned for the caller to
    /// surface.
    pub async fn refresh_store(&self, store: &TokenStore, claims: &ClaimsResult, now: i64) -> AuthResult<Option<Session>> {
        let Some(session) = store.get().await else {
            return Ok(None);
        };

        match self.maybe_refresh(claims, &session, now).await {
            Ok(Some(fresh)) => {
                store.swap(fresh.clone()).await;
                Ok(Some(fresh))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                if self.on_failure == RefreshFailurePolicy::ClearSession {
                    store.clear().await;
                }
                Err(e)
            }
        }
    }
}
