//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{Credentials, LogoutReason, Session},
    store::TokenStore,
};
use crate::baas::{AuthApi, BaasError};
use crate::logging::log_security_event;
use std::sync::Arc;

/// Drives login, signup, SSO and logout against the auth provider and
/// keeps the token store in step.
#[derive(Clone)]
pub struct AuthManager {
    api: Arc<dyn AuthApi>,
    store: TokenStore,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `api` - Auth provider client
    /// * `store` - The visitor's token store; written on successful login
    pub fn new(api: Arc<dyn AuthApi>, store: TokenStore) -> Self {
        Self { api, store }
    }

    /// Log in with email and password
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredentials` - Either field is empty
    /// * `AuthError::Provider` - Provider rejected the credentials; carries its message
    /// * `AuthError::Backend` - Transport failure
    pub async fn login_with_password(&self, credentials: Credentials) -> AuthResult<()> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let session = self
            .api
            .password_grant(email, &credentials.password)
            .await
            .map_err(provider_error)?;

        self.store.set(session).await;
        tracing::info!("Password login succeeded");
        Ok(())
    }

    /// Create an account. The provider emails a confirmation link; no
    /// session is issued until the user confirms and logs in.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email is empty or lacks an `@`
    /// * `AuthError::PasswordMismatch` - Confirmation differs
    /// * `AuthError::Provider` - Provider rejected the signup (e.g. already registered)
    pub async fn signup(&self, credentials: Credentials, password_confirm: &str) -> AuthResult<()> {
        let email = credentials.email.trim();
        validate_email(email)?;
        if credentials.password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        self.api
            .signup(email, &credentials.password)
            .await
            .map_err(provider_error)?;
        tracing::info!("Signup submitted, awaiting email confirmation");
        Ok(())
    }

    /// URL to send the visitor to for SSO with `provider`
    pub fn sso_authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        self.api.authorize_url(provider, redirect_to)
    }

    /// Finish SSO using the callback URL the provider redirected to
    ///
    /// # Errors
    ///
    /// * `AuthError::MalformedRedirect` - Fragment lacks either token
    /// * `AuthError::Provider` - Provider reported an error in the fragment
    pub async fn complete_sso(&self, redirect_url: &str) -> AuthResult<()> {
        match Session::from_redirect_fragment(redirect_url) {
            Ok(session) => {
                self.store.set(session).await;
                tracing::info!("SSO login completed");
                Ok(())
            }
            Err(e) => {
                log_security_event("sso_failed", None, &e.to_string());
                Err(e)
            }
        }
    }

    /// End the session and return the alert to show.
    ///
    /// Server-side revocation is best effort: the local session is always
    /// cleared, even if the provider can't be reached.
    pub async fn logout(&self, reason: LogoutReason) -> &'static str {
        if let Some(session) = self.store.clear().await
            && let Err(e) = self.api.logout(&session.access_token).await
        {
            tracing::warn!(error = %e, "Server-side logout failed");
        }
        reason.alert_message()
    }
}

/// Client errors from the provider become inline form messages
fn provider_error(err: BaasError) -> AuthError {
    match err {
        BaasError::Status { status, message } if (400..500).contains(&status) => AuthError::Provider(message),
        other => AuthError::Backend(other),
    }
}

fn validate_email(email: &str) -> AuthResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AuthError::InvalidEmail),
    }
}
