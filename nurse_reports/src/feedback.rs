//! User feedback: validated, rate limited, stored, and forwarded to support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::baas::{BaasError, FeedbackRepository};
use crate::clock::Clock;
use crate::email::EmailSender;
use crate::logging::log_security_event;

/// Longest accepted message, in characters
pub const FEEDBACK_MAX_CHARS: usize = 1000;

/// Row of the feedback table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub user_id: String,
    #[serde(rename = "user_feedback")]
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// At most `max_entries` per `window`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub max_entries: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_entries: 1,
            window: Duration::minutes(1),
        }
    }
}

/// Feedback errors
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback is empty")]
    Empty,

    #[error("Feedback is {0} characters, limit is 1000")]
    TooLong(usize),

    #[error("Rate limited: {limit} per {minutes} minute(s)")]
    RateLimited { limit: u32, minutes: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] BaasError),
}

impl FeedbackError {
    pub fn client_message(&self) -> String {
        match self {
            FeedbackError::Empty => "Please enter your feedback.".to_string(),
            FeedbackError::TooLong(_) => {
                format!("Feedback is limited to {} characters.", FEEDBACK_MAX_CHARS)
            }
            FeedbackError::RateLimited { limit, minutes } => format!(
                "Too many submissions. The limit is {} submission(s) per {} minute(s).",
                limit, minutes
            ),
            FeedbackError::Storage(e) => e.client_message(),
        }
    }
}

/// Result type for feedback
pub type FeedbackResult<T> = Result<T, FeedbackError>;

/// Support inbox copy of each entry
#[derive(Clone)]
struct SupportMail {
    sender: Arc<dyn EmailSender>,
    from: String,
    to: String,
}

/// Accepts feedback from signed-in users
#[derive(Clone)]
pub struct FeedbackService {
    repository: Arc<dyn FeedbackRepository>,
    clock: Arc<dyn Clock>,
    limit: RateLimit,
    support: Option<SupportMail>,
}

impl FeedbackService {
    pub fn new(repository: Arc<dyn FeedbackRepository>, clock: Arc<dyn Clock>, limit: RateLimit) -> Self {
        Self {
            repository,
            clock,
            limit,
            support: None,
        }
    }

    /// Also email each entry to `to`
    pub fn with_support_email(
        mut self,
        sender: Arc<dyn EmailSender>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.support = Some(SupportMail {
            sender,
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Store a message.
    ///
    /// # Errors
    ///
    /// * `FeedbackError::Empty` / `FeedbackError::TooLong` - bad message
    /// * `FeedbackError::RateLimited` - user hit the limit
    /// * `FeedbackError::Storage` - backend failure
    pub async fn submit(&self, token: &str, user_id: &str, message: &str) -> FeedbackResult<FeedbackEntry> {
        let message = message.trim();
        if message.is_empty() {
            return Err(FeedbackError::Empty);
        }
        let chars = message.chars().count();
        if chars > FEEDBACK_MAX_CHARS {
            return Err(FeedbackError::TooLong(chars));
        }

        let now = self.clock.now();
        let recent = self
            .repository
            .count_recent(token, user_id, now - self.limit.window)
            .await?;
        if recent >= self.limit.max_entries as usize {
            log_security_event("FEEDBACK_RATE_LIMITED", Some(user_id), "Feedback rate limit reached");
            return Err(FeedbackError::RateLimited {
                limit: self.limit.max_entries,
                minutes: self.limit.window.num_minutes(),
            });
        }

        let entry = FeedbackEntry {
            user_id: user_id.to_string(),
            message: message.to_string(),
            created_at: now,
        };
        self.repository.insert_feedback(token, &entry).await?;
        tracing::info!(user_id = %user_id, "Feedback submitted");

        if let Some(support) = &self.support {
            let subject = format!("Feedback from {}", user_id);
            if let Err(e) = support
                .sender
                .send(&support.from, &[support.to.as_str()], &subject, &entry.message)
                .await
            {
                tracing::warn!(user_id = %user_id, error = %e, "Feedback stored but support email failed");
            }
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::BaasResult;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryFeedback {
        entries: Mutex<Vec<FeedbackEntry>>,
    }

    #[async_trait]
    impl FeedbackRepository for MemoryFeedback {
        async fn count_recent(&self, _token: &str, user_id: &str, since: DateTime<Utc>) -> BaasResult<usize> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id && e.created_at >= since)
                .count())
        }

        async fn insert_feedback(&self, _token: &str, entry: &FeedbackEntry) -> BaasResult<()> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct FailingEmail;

    #[async_trait]
    impl EmailSender for FailingEmail {
        async fn send(&self, _sender: &str, _recipients: &[&str], _subject: &str, _body: &str) -> BaasResult<()> {
            Err(BaasError::Status {
                status: 500,
                message: "down".to_string(),
            })
        }
    }

    fn service(clock: Arc<ManualClock>) -> (FeedbackService, Arc<MemoryFeedback>) {
        let repo = Arc::new(MemoryFeedback::default());
        (FeedbackService::new(repo.clone(), clock, RateLimit::default()), repo)
    }

    #[tokio::test]
    async fn test_rejects_empty_and_long() {
        let (service, _) = service(Arc::new(ManualClock::at_unix(1_700_000_000)));
        assert!(matches!(service.submit("t", "u", "   ").await, Err(FeedbackError::Empty)));

        let long = "x".repeat(FEEDBACK_MAX_CHARS + 1);
        assert!(matches!(service.submit("t", "u", &long).await, Err(FeedbackError::TooLong(1001))));
    }

    #[tokio::test]
    async fn test_rate_limit_window() {
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let (service, repo) = service(clock.clone());

        service.submit("t", "u", "Great site").await.unwrap();
        let err = service.submit("t", "u", "Again").await.unwrap_err();
        assert_eq!(
            err.client_message(),
            "Too many submissions. The limit is 1 submission(s) per 1 minute(s)."
        );

        // Other users are unaffected
        service.submit("t", "other", "Hello").await.unwrap();

        clock.advance(Duration::seconds(61));
        service.submit("t", "u", "Again").await.unwrap();
        assert_eq!(repo.entries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_submit() {
        let (service, repo) = service(Arc::new(ManualClock::at_unix(1_700_000_000)));
        let service = service.with_support_email(
            Arc::new(FailingEmail),
            "noreply@nursereports.org",
            "support@nursereports.org",
        );

        let entry = service.submit("t", "u", "  The unit list is wrong  ").await.unwrap();
        assert_eq!(entry.message, "The unit list is wrong");
        assert_eq!(repo.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_entry_serializes_user_feedback_column() {
        let entry = FeedbackEntry {
            user_id: "u".to_string(),
            message: "hi".to_string(),
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["user_feedback"], "hi");
    }
}
