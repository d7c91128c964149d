//! Page-entry flow: read the session, refresh it if due, load the profile,
//! then ask the gate.

use super::claims::{ClaimsDecoder, ClaimsResult};
use super::gate::{self, AccessLevel, DenyReason};
use super::models::LogoutReason;
use super::refresher::SessionRefresher;
use super::store::TokenStore;
use crate::clock::Clock;
use crate::logging::log_security_event;
use crate::profile::{ProfileService, UserProfile};
use std::sync::Arc;

/// Everything a page needs after the visitor is let in
#[derive(Debug, Clone)]
pub struct PageContext {
    pub claims: ClaimsResult,
    pub profile: Option<UserProfile>,
    /// Tokens were exchanged during this entry
    pub refreshed: bool,
    /// One-time alert (expired or corrupted token on a public page)
    pub alert: Option<&'static str>,
    /// Toast for a failed refresh; the visitor still gets in
    pub notice: Option<String>,
}

impl PageContext {
    pub fn user_id(&self) -> Option<&str> {
        self.claims.user_id()
    }
}

/// Why a page was not shown, and where to send the visitor instead
#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    /// The gate said no
    Access {
        reason: DenyReason,
        alert: Option<&'static str>,
    },
    /// Loading the visitor's profile failed
    Failure { message: String },
}

impl Denial {
    pub fn redirect_target(&self) -> &'static str {
        match self {
            Denial::Access { reason, .. } => reason.redirect_target(),
            Denial::Failure { .. } => "/logout/error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Denial::Access { reason, .. } => reason.message().to_string(),
            Denial::Failure { message } => message.clone(),
        }
    }

    pub fn alert(&self) -> Option<&'static str> {
        match self {
            Denial::Access { alert, .. } => *alert,
            Denial::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Denial::Access { reason, .. } => Some(*reason),
            Denial::Failure { .. } => None,
        }
    }
}

/// Runs the page-entry flow for one visitor
#[derive(Clone)]
pub struct PageGuard {
    store: TokenStore,
    decoder: ClaimsDecoder,
    refresher: SessionRefresher,
    profiles: ProfileService,
    clock: Arc<dyn Clock>,
}

impl PageGuard {
    pub fn new(
        store: TokenStore,
        decoder: ClaimsDecoder,
        refresher: SessionRefresher,
        profiles: ProfileService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            decoder,
            refresher,
            profiles,
            clock,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Decide whether the visitor may enter a page at `level`.
    ///
    /// Order matters: a refresh happens before the final read of the store
    /// and clock, so the gate always judges the freshest tokens.
    ///
    /// # Arguments
    ///
    /// * `level` - what the page requires
    /// * `cached` - profile loaded on an earlier page, reused unless the
    ///   stored row changed since
    pub async fn enter(&self, level: AccessLevel, cached: Option<UserProfile>) -> Result<PageContext, Denial> {
        let now = self.clock.unix();
        let token = self.store.access_token().await;
        let initial = self.decoder.decode(token.as_deref(), now);

        let mut refreshed = false;
        let mut notice = None;
        if self.refresher.should_refresh(&initial, now) {
            match self.refresher.refresh_store(&self.store, &initial, now).await {
                Ok(fresh) => refreshed = fresh.is_some(),
                Err(e) => notice = Some(e.client_message()),
            }
        }

        let now = self.clock.unix();
        let token = self.store.access_token().await;
        let claims = self.decoder.decode(token.as_deref(), now);

        let alert = claims.alert_message();
        if alert.is_some() {
            log_security_event(
                "session_dropped",
                initial.user_id(),
                "Clearing expired or corrupted session",
            );
            self.store.clear().await;
        }

        let profile = match claims.user_id() {
            Some(user_id) => {
                let token = token.as_deref().unwrap_or_default();
                let loaded = match cached.filter(|p| p.user_id == user_id) {
                    Some(profile) => self
                        .profiles
                        .refresh_if_modified(token, &profile)
                        .await
                        .map(|fresh| fresh.unwrap_or(profile)),
                    None => self.profiles.load_or_create(token, user_id).await,
                };
                match loaded {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::error!(user_id = user_id, error = %e, "Failed to load profile");
                        return Err(Denial::Failure {
                            message: e.client_message(),
                        });
                    }
                }
            }
            None => None,
        };

        if let Err(reason) = gate::check(level, &claims, profile.as_ref()) {
            tracing::info!(level = ?level, reason = ?reason, "Page access denied");
            return Err(Denial::Access { reason, alert });
        }

        Ok(PageContext {
            claims,
            profile,
            refreshed,
            alert,
            notice,
        })
    }

    /// End the local session and return the alert to show
    pub async fn logout(&self, reason: LogoutReason) -> &'static str {
        self.store.clear().await;
        tracing::info!(reason = ?reason, "Session cleared");
        reason.alert_message()
    }
}
