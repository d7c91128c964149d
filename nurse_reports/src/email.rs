//! Outbound transactional email.

use async_trait::async_trait;
use std::time::Instant;

use crate::baas::timeouts::{DEFAULT_REQUEST_TIMEOUT, with_timeout};
use crate::baas::{BaasError, BaasResult};
use crate::config::EmailConfig;
use crate::logging::log_remote_call;

/// Sends plain-text email
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, sender: &str, recipients: &[&str], subject: &str, body: &str) -> BaasResult<()>;
}

/// Mailgun messages API
#[derive(Clone)]
pub struct MailgunSender {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl MailgunSender {
    pub fn new(config: &EmailConfig) -> BaasResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Form fields for one message; Mailgun takes repeated `to` fields
fn form_fields<'a>(
    sender: &'a str,
    recipients: &[&'a str],
    subject: &'a str,
    body: &'a str,
) -> Vec<(&'static str, &'a str)> {
    let mut fields = vec![("from", sender)];
    fields.extend(recipients.iter().map(|r| ("to", *r)));
    fields.push(("subject", subject));
    fields.push(("text", body));
    fields
}

#[async_trait]
impl EmailSender for MailgunSender {
    async fn send(&self, sender: &str, recipients: &[&str], subject: &str, body: &str) -> BaasResult<()> {
        if recipients.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let request = self
            .http
            .post(&self.url)
            .basic_auth("api", Some(&self.api_key))
            .form(&form_fields(sender, recipients, subject, body));

        let result = with_timeout(DEFAULT_REQUEST_TIMEOUT, async {
            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(BaasError::Status {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                })
            }
        })
        .await;

        log_remote_call("mailgun", "send", started.elapsed().as_millis() as u64, result.is_ok());
        match &result {
            Ok(()) => tracing::debug!(recipients = recipients.len(), "Email sent"),
            Err(e) => tracing::error!(recipients = recipients.len(), error = %e, "Email send failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_repeat_recipients() {
        let fields = form_fields(
            "noreply@nursereports.org",
            &["a@example.com", "b@example.com"],
            "Hello",
            "Body",
        );
        assert_eq!(fields[0], ("from", "noreply@nursereports.org"));
        assert_eq!(fields.iter().filter(|(k, _)| *k == "to").count(), 2);
        assert_eq!(fields.last(), Some(&("text", "Body")));
    }

    #[tokio::test]
    async fn test_no_recipients_is_noop() {
        let sender = MailgunSender::new(&EmailConfig {
            url: "http://127.0.0.1:9/messages".to_string(),
            api_key: "key".to_string(),
            sender: "noreply@nursereports.org".to_string(),
            support_address: "support@nursereports.org".to_string(),
        })
        .unwrap();
        assert!(sender.send("noreply@nursereports.org", &[], "s", "b").await.is_ok());
    }
}
