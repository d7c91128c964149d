//! Authentication data models.

use super::errors::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The token pair issued by the auth provider.
///
/// `Debug` never prints token contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Parse the session out of an SSO callback URL.
    ///
    /// The provider appends the tokens to the URL fragment:
    /// `https://host/callback#access_token=...&expires_in=3600&refresh_token=...`.
    /// Keys are located by name, so parameter order does not matter.
    ///
    /// # Errors
    ///
    /// - `AuthError::Provider` if the fragment carries an `error_description`
    /// - `AuthError::MalformedRedirect` if either token is missing or empty
    pub fn from_redirect_fragment(url: &str) -> AuthResult<Self> {
        let (_, fragment) = url.split_once('#').ok_or(AuthError::MalformedRedirect)?;

        let mut access_token = None;
        let mut refresh_token = None;

        for pair in fragment.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "access_token" => access_token = Some(value),
                "refresh_token" => refresh_token = Some(value),
                "error_description" => {
                    return Err(AuthError::Provider(value.replace('+', " ")));
                }
                _ => {}
            }
        }

        match (access_token, refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(Session::new(access, refresh))
            }
            _ => Err(AuthError::MalformedRedirect),
        }
    }
}

/// Claims carried by the provider's access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Informational flag set by the backend once a report is on file.
    /// Access decisions use the loaded profile instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reported: Option<bool>,
    /// Anything else the provider put in the token
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Seconds until expiry (negative once expired)
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Email/password form data
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Why the session is being ended; selects the alert shown afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    User,
    Error,
    Expired,
}

impl LogoutReason {
    pub fn alert_message(&self) -> &'static str {
        match self {
            LogoutReason::User => "Successfully logged out.",
            LogoutReason::Error => {
                "Encountered an error. If this message persists, please contact support@nursereports.org."
            }
            LogoutReason::Expired => "For your security, you've been logged out for inactivity.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_is_redacted() {
        let session = Session::new("secret-access", "secret-refresh");
        let printed = format!("{:?}", session);
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_redirect_fragment_any_order() {
        let url = "https://nursereports.org/callback#expires_in=3600&refresh_token=r1&token_type=bearer&access_token=a1";
        let session = Session::from_redirect_fragment(url).unwrap();
        assert_eq!(session.access_token, "a1");
        assert_eq!(session.refresh_token, "r1");
    }

    #[test]
    fn test_redirect_fragment_missing_token() {
        let url = "https://nursereports.org/callback#access_token=a1&expires_in=3600";
        assert!(matches!(
            Session::from_redirect_fragment(url),
            Err(AuthError::MalformedRedirect)
        ));
        assert!(matches!(
            Session::from_redirect_fragment("https://nursereports.org/callback"),
            Err(AuthError::MalformedRedirect)
        ));
    }

    #[test]
    fn test_redirect_fragment_provider_error() {
        let url = "https://nursereports.org/callback#error=access_denied&error_description=User+cancelled+login";
        match Session::from_redirect_fragment(url) {
            Err(AuthError::Provider(message)) => assert_eq!(message, "User cancelled login"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_claims_keep_unknown_fields() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "user-1",
            "exp": 1_700_000_000,
            "aud": "authenticated",
            "session_id": "abc"
        }))
        .unwrap();
        assert_eq!(claims.extra.get("session_id").unwrap(), "abc");
        assert_eq!(claims.seconds_remaining(1_699_999_000), 1000);
    }
}
