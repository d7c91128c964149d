//! Access token verification.

use super::models::Claims;
use crate::logging::log_security_event;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

/// Outcome of decoding an access token
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimsResult {
    Valid(Claims),
    /// Signature checks out but `exp` has passed
    Expired,
    /// Bad signature, wrong audience or algorithm, or not a JWT at all
    Invalid,
    /// No token
    Absent,
    /// Any other decode failure
    Other(String),
}

impl ClaimsResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ClaimsResult::Valid(_))
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            ClaimsResult::Valid(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.claims().map(|claims| claims.sub.as_str())
    }

    /// One-time alert to show the user for this outcome
    pub fn alert_message(&self) -> Option<&'static str> {
        match self {
            ClaimsResult::Expired => Some("For your security, you've been logged out for inactivity."),
            ClaimsResult::Invalid => Some("Access token corrupted. Login to refresh."),
            _ => None,
        }
    }
}

/// Verifies HS256 access tokens issued by the auth provider.
///
/// Expiry is compared against the `now` passed in rather than the system
/// clock, so decoding is a pure function of `(token, now)`.
#[derive(Clone)]
pub struct ClaimsDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl ClaimsDecoder {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and classify `token` as of unix time `now`
    pub fn decode(&self, token: Option<&str>, now: i64) -> ClaimsResult {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return ClaimsResult::Absent;
        };

        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) if data.claims.exp <= now => {
                tracing::debug!(user_id = %data.claims.sub, "Access token expired");
                ClaimsResult::Expired
            }
            Ok(data) => ClaimsResult::Valid(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => ClaimsResult::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => {
                    log_security_event("claims_invalid", None, &format!("Rejected access token: {}", e));
                    ClaimsResult::Invalid
                }
                _ => {
                    tracing::warn!(error = %e, "Access token could not be decoded");
                    ClaimsResult::Other(e.to_string())
                }
            },
        }
    }
}
