//! Free-text classification through an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::time::{Duration, Instant};

use super::errors::{ClassifyResult, ModerationError};
use super::models::{FieldVerdict, FreeTextField};
use crate::baas::timeouts::LONG_OPERATION_TIMEOUT;
use crate::config::ModerationConfig;
use crate::logging::log_remote_call;

const SYSTEM_PROMPT: &str = "You moderate entries for a nurse review site. Entries may contain \
location data about where a nurse works at a hospital. Entries may also contain comments nurses \
are allowed to share with their peers about pay, staffing, or work environment. Flag an entry if \
it contains violence, protected health information, off-topic or nonsensical content, spam, \
advertisements, racism, sexism, or doxxing. Profanity and strong emotion are acceptable when on \
topic. Respond with a JSON object whose key 'results' holds one object per entry with keys \
'field_name' (the entry's key), 'flag' (true or false) and 'reason' (a brief rationale when \
flagged, otherwise an empty string).";

/// Decides which free-text entries are unacceptable
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// One verdict per entry the classifier recognised; entries it skipped
    /// are treated as not flagged.
    async fn classify(&self, entries: &[(FreeTextField, String)]) -> ClassifyResult<Vec<FieldVerdict>>;
}

/// Classifier backed by `/chat/completions`
#[derive(Clone)]
pub struct ChatCompletionsClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionsClassifier {
    /// # Errors
    ///
    /// Returns `ModerationError::Http` if the HTTP client can't be built.
    pub fn new(config: &ModerationConfig) -> ClassifyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(LONG_OPERATION_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: LONG_OPERATION_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_body(&self, entries: &[(FreeTextField, String)]) -> serde_json::Value {
        let user_entries: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(field, text)| (field.column().to_string(), json!(text)))
            .collect();

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": serde_json::Value::Object(user_entries).to_string() },
            ],
            "temperature": 0.7,
            "max_completion_tokens": 1024,
            "stream": false,
            "response_format": { "type": "json_object" },
        })
    }

    async fn complete(&self, entries: &[(FreeTextField, String)]) -> ClassifyResult<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(entries))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| ModerationError::MalformedResponse(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModerationError::MalformedResponse("completion had no content".to_string()))
    }
}

#[async_trait]
impl TextClassifier for ChatCompletionsClassifier {
    async fn classify(&self, entries: &[(FreeTextField, String)]) -> ClassifyResult<Vec<FieldVerdict>> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.complete(entries)).await {
            Ok(content) => content.and_then(|c| parse_verdicts(&c)),
            Err(_) => Err(ModerationError::Timeout(self.timeout)),
        };
        log_remote_call(
            "moderation",
            "chat_completions",
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        result
    }
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerdictList {
    results: Vec<RawVerdict>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    field_name: String,
    #[serde(deserialize_with = "bool_or_int")]
    flag: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Models sometimes answer `1`/`0` instead of `true`/`false`
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// Parse the completion content; results naming unknown fields are dropped
pub fn parse_verdicts(content: &str) -> ClassifyResult<Vec<FieldVerdict>> {
    let list: VerdictList =
        serde_json::from_str(content).map_err(|e| ModerationError::MalformedResponse(e.to_string()))?;

    Ok(list
        .results
        .into_iter()
        .filter_map(|raw| {
            let Some(field) = FreeTextField::from_column(&raw.field_name) else {
                tracing::debug!(field_name = %raw.field_name, "Classifier named an unknown field");
                return None;
            };
            Some(FieldVerdict {
                field,
                flagged: raw.flag,
                reason: raw.reason.filter(|r| !r.is_empty()),
            })
        })
        .collect())
}
