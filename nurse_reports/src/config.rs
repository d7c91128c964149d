//! Application configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::{
    auth::{RefreshFailurePolicy, RefreshWindow},
    baas::BaasConfig,
    feedback::RateLimit,
    moderation::RetryPolicy,
    report::SubmissionPolicy,
};
use std::time::Duration;

/// Longest accepted duplicate-report window
pub const MAX_DUPLICATE_WINDOW_DAYS: i64 = 3650;

/// Complete configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend-as-a-service endpoints and credentials
    pub baas: BaasConfig,
    /// Token verification settings
    pub security: SecurityConfig,
    /// Session refresh behaviour
    pub session: SessionConfig,
    /// Report submission limits
    pub submission: SubmissionPolicy,
    /// Moderation endpoint, absent when no API key is configured
    pub moderation: Option<ModerationConfig>,
    /// Outbound email, absent when no provider key is configured
    pub email: Option<EmailConfig>,
    /// Feedback rate limit
    pub feedback: RateLimit,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Shared secret the auth provider signs access tokens with (required)
    pub jwt_key: String,
    /// Expected `aud` claim
    pub audience: String,
}

/// Session refresh configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub refresh_window: RefreshWindow,
    pub refresh_failure: RefreshFailurePolicy,
}

/// Moderation endpoint configuration
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended)
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub retry: RetryPolicy,
    pub queue_capacity: usize,
}

/// Transactional email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Full messages endpoint of the provider
    pub url: String,
    pub api_key: String,
    pub sender: String,
    pub support_address: String,
}

impl AppConfig {
    /// Load `.env` (if present), read the environment, and validate.
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = required("SUPABASE_URL", "Project URL, e.g. https://<ref>.supabase.co")?;
        let anon_key = required("SUPABASE_ANON_KEY", "Project API settings -> anon public key")?;
        let jwt_key = required("SUPABASE_JWT_KEY", "Project API settings -> JWT secret")?;

        let baas = BaasConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            anon_key,
            request_timeout: Duration::from_secs(parse_env_or("REQUEST_TIMEOUT_SECS", 10)?),
        };

        let security = SecurityConfig {
            jwt_key,
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
        };

        let refresh_failure = match std::env::var("REFRESH_FAILURE_POLICY") {
            Err(_) => RefreshFailurePolicy::default(),
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "keep" => RefreshFailurePolicy::KeepSession,
                "clear" => RefreshFailurePolicy::ClearSession,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "REFRESH_FAILURE_POLICY".to_string(),
                        reason: format!("Expected 'keep' or 'clear', got '{}'", value),
                    });
                }
            },
        };

        let session = SessionConfig {
            refresh_window: RefreshWindow {
                min_secs: parse_env_or("REFRESH_MIN_SECS", 5)?,
                max_secs: parse_env_or("REFRESH_MAX_SECS", 1800)?,
            },
            refresh_failure,
        };

        let submission = SubmissionPolicy {
            id_retry_limit: parse_env_or("REPORT_ID_RETRY_LIMIT", 4)?,
            duplicate_window: days_or("DUPLICATE_WINDOW_DAYS", 30)?,
        };

        let moderation = match std::env::var("MODERATION_API_KEY") {
            Ok(api_key) => Some(ModerationConfig {
                api_url: std::env::var("MODERATION_API_URL")
                    .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key,
                model: std::env::var("MODERATION_MODEL")
                    .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
                retry: RetryPolicy {
                    max_attempts: parse_env_or("MODERATION_MAX_ATTEMPTS", 1)?,
                    backoff: Duration::from_millis(parse_env_or("MODERATION_BACKOFF_MS", 500)?),
                },
                queue_capacity: parse_env_or("MODERATION_QUEUE_CAPACITY", 100)?,
            }),
            Err(_) => None,
        };
        if moderation.is_none() {
            tracing::warn!("MODERATION_API_KEY not set, submitted free text will not be moderated");
        }

        let email = match (std::env::var("MAILGUN_URL"), std::env::var("MAILGUN_API_KEY")) {
            (Ok(url), Ok(api_key)) => Some(EmailConfig {
                url,
                api_key,
                sender: std::env::var("EMAIL_SENDER")
                    .unwrap_or_else(|_| "Nurse Reports <noreply@nursereports.org>".to_string()),
                support_address: std::env::var("SUPPORT_EMAIL")
                    .unwrap_or_else(|_| "support@nursereports.org".to_string()),
            }),
            _ => None,
        };

        let feedback = RateLimit {
            max_entries: parse_env_or("FEEDBACK_LIMIT", 1)?,
            window: minutes_or("FEEDBACK_WINDOW_MINUTES", 1)?,
        };

        Ok(AppConfig {
            baas,
            security,
            session,
            submission,
            moderation,
            email,
            feedback,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.baas.api_url.starts_with("https://") || self.baas.api_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                var: "SUPABASE_URL".to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }

        if self.security.jwt_key.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "SUPABASE_JWT_KEY".to_string(),
                reason: "Must be at least 32 characters".to_string(),
            });
        }

        if self.baas.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let window = &self.session.refresh_window;
        if window.min_secs < 0 || window.max_secs <= window.min_secs {
            return Err(ConfigError::Invalid {
                var: "REFRESH_MAX_SECS".to_string(),
                reason: format!(
                    "Must be greater than REFRESH_MIN_SECS ({}) and both non-negative",
                    window.min_secs
                ),
            });
        }

        let window = self.submission.duplicate_window;
        if window < chrono::Duration::days(1) || window > chrono::Duration::days(MAX_DUPLICATE_WINDOW_DAYS) {
            return Err(ConfigError::Invalid {
                var: "DUPLICATE_WINDOW_DAYS".to_string(),
                reason: format!("Must be between 1 and {}", MAX_DUPLICATE_WINDOW_DAYS),
            });
        }

        if let Some(moderation) = &self.moderation {
            if moderation.retry.max_attempts == 0 {
                return Err(ConfigError::Invalid {
                    var: "MODERATION_MAX_ATTEMPTS".to_string(),
                    reason: "Must be at least 1".to_string(),
                });
            }
            if moderation.queue_capacity == 0 {
                return Err(ConfigError::Invalid {
                    var: "MODERATION_QUEUE_CAPACITY".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        if self.feedback.window <= chrono::Duration::zero() {
            return Err(ConfigError::Invalid {
                var: "FEEDBACK_WINDOW_MINUTES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.feedback.max_entries == 0 {
            return Err(ConfigError::Invalid {
                var: "FEEDBACK_LIMIT".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn required(var: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            var: var.to_string(),
            hint: hint.to_string(),
        })
}

/// Parse an environment variable, using `default` when it's unset
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => value.trim().parse().map_err(|e| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{}' is not valid: {}", value, e),
        }),
    }
}

fn days_or(key: &str, default: i64) -> Result<chrono::Duration, ConfigError> {
    let days = parse_env_or(key, default)?;
    chrono::Duration::try_days(days).ok_or_else(|| out_of_range(key))
}

fn minutes_or(key: &str, default: i64) -> Result<chrono::Duration, ConfigError> {
    let minutes = parse_env_or(key, default)?;
    chrono::Duration::try_minutes(minutes).ok_or_else(|| out_of_range(key))
}

fn out_of_range(key: &str) -> ConfigError {
    ConfigError::Invalid {
        var: key.to_string(),
        reason: "Value out of range".to_string(),
    }
}
