//! HTTP client for the hosted backend's REST and auth endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use uuid::Uuid;

use super::config::BaasConfig;
use super::errors::{BaasError, BaasResult};
use super::query::{Filter, query_pairs};
use super::repository::{
    AuthApi, FeedbackRepository, HospitalRepository, ReportRepository, UserRepository,
};
use super::timeouts::with_timeout;
use crate::auth::Session;
use crate::feedback::FeedbackEntry;
use crate::logging::log_remote_call;
use crate::moderation::ModerationResult;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::report::{Departments, Hospital, Report};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

impl From<TokenResponse> for Session {
    fn from(response: TokenResponse) -> Self {
        Session::new(response.access_token, response.refresh_token)
    }
}

#[derive(Debug, Deserialize)]
struct ModifiedAtRow {
    modified_at: DateTime<Utc>,
}

/// Client for communicating with the hosted backend
#[derive(Clone)]
pub struct BaasClient {
    config: BaasConfig,
    http: reqwest::Client,
}

impl BaasClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `BaasError::Http` if the TLS backend can't be initialized.
    pub fn new(config: BaasConfig) -> BaasResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BaasConfig {
        &self.config
    }

    /// Attach the project key and the caller's bearer token
    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    fn anonymous(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    /// Send with timeout, check the status, and log the call
    async fn send(&self, operation: &str, request: RequestBuilder) -> BaasResult<Response> {
        let started = Instant::now();
        let result = with_timeout(self.config.request_timeout, async {
            let response = request.send().await?;
            check_status(response).await
        })
        .await;

        log_remote_call(
            "baas",
            operation,
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        if let Err(e) = &result {
            tracing::warn!(operation = operation, error = %e, "Backend request failed");
        }
        result
    }

    async fn rows<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> BaasResult<Vec<T>> {
        let response = self.send(operation, request).await?;
        decode(response).await
    }

    /// At most one row; more is an error
    async fn single_row<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> BaasResult<Option<T>> {
        let mut rows: Vec<T> = self.rows(operation, request).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(BaasError::TooManyRows(n)),
        }
    }

    fn select(&self, table: &str, token: &str, filters: &[Filter], columns: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.config.rest_url(table)), token)
            .query(&query_pairs(filters, columns))
    }

    fn patch(&self, table: &str, token: &str, filters: &[Filter]) -> RequestBuilder {
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::to_pair).collect();
        self.authorized(self.http.patch(self.config.rest_url(table)), token)
            .query(&pairs)
            .header("Prefer", "return=minimal")
    }

    fn insert(&self, table: &str, token: &str) -> RequestBuilder {
        self.authorized(self.http.post(self.config.rest_url(table)), token)
            .header("Prefer", "return=minimal")
    }
}

async fn check_status(response: Response) -> BaasResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
    Err(BaasError::Status {
        status: status.as_u16(),
        message: provider_message(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> BaasResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| BaasError::Decode(e.to_string()))
}

/// Pull the human-readable message out of an error body.
///
/// The auth service uses `error_description` or `msg`; the REST service uses
/// `message`. Falls back to the (truncated) raw body.
pub(crate) fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[async_trait]
impl AuthApi for BaasClient {
    async fn password_grant(&self, email: &str, password: &str) -> BaasResult<Session> {
        let request = self
            .anonymous(self.http.post(self.config.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = self.send("POST /auth/token (password)", request).await?;
        decode::<TokenResponse>(response).await.map(Session::from)
    }

    async fn signup(&self, email: &str, password: &str) -> BaasResult<()> {
        let request = self
            .anonymous(self.http.post(self.config.auth_url("signup")))
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.send("POST /auth/signup", request).await?;
        Ok(())
    }

    async fn refresh(&self, access_token: &str, refresh_token: &str) -> BaasResult<Session> {
        let request = self
            .authorized(self.http.post(self.config.auth_url("token")), access_token)
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));
        let response = self.send("POST /auth/token (refresh)", request).await?;
        decode::<TokenResponse>(response).await.map(Session::from)
    }

    fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> String {
        let base = self.config.auth_url("authorize");
        let mut params = vec![("provider", provider)];
        if let Some(redirect_to) = redirect_to {
            params.push(("redirect_to", redirect_to));
        }
        match reqwest::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed auth URL, falling back to plain format");
                format!("{}?provider={}", base, provider)
            }
        }
    }

    async fn logout(&self, access_token: &str) -> BaasResult<()> {
        let request = self.authorized(self.http.post(self.config.auth_url("logout")), access_token);
        self.send("POST /auth/logout", request).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for BaasClient {
    async fn get_profile(&self, token: &str, user_id: &str) -> BaasResult<Option<UserProfile>> {
        let request = self.select("users", token, &[Filter::eq("user_id", user_id)], "*");
        self.single_row("GET /users", request).await
    }

    async fn create_profile(&self, token: &str, user_id: &str) -> BaasResult<()> {
        let request = self
            .insert("users", token)
            .json(&serde_json::json!({ "user_id": user_id }));
        self.send("POST /users", request).await?;
        Ok(())
    }

    async fn get_modified_at(&self, token: &str, user_id: &str) -> BaasResult<Option<DateTime<Utc>>> {
        let request = self.select(
            "users",
            token,
            &[Filter::eq("user_id", user_id)],
            "modified_at",
        );
        let row: Option<ModifiedAtRow> = self.single_row("GET /users (modified_at)", request).await?;
        Ok(row.map(|r| r.modified_at))
    }

    async fn update_profile(&self, token: &str, user_id: &str, update: &ProfileUpdate) -> BaasResult<()> {
        let request = self
            .patch("users", token, &[Filter::eq("user_id", user_id)])
            .json(update);
        self.send("PATCH /users", request).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for BaasClient {
    async fn report_exists(&self, token: &str, report_id: Uuid) -> BaasResult<bool> {
        let request = self.select(
            "reports",
            token,
            &[Filter::eq("report_id", report_id)],
            "report_id",
        );
        let rows: Vec<serde_json::Value> = self.rows("GET /reports (id check)", request).await?;
        Ok(!rows.is_empty())
    }

    async fn get_report(&self, token: &str, report_id: Uuid) -> BaasResult<Option<Report>> {
        let request = self.select("reports", token, &[Filter::eq("report_id", report_id)], "*");
        self.single_row("GET /reports", request).await
    }

    async fn find_recent_report(
        &self,
        token: &str,
        user_id: &str,
        hospital_id: &str,
        placement_key: &str,
        since: DateTime<Utc>,
    ) -> BaasResult<Option<Report>> {
        let filters = [
            Filter::eq("user_id", user_id),
            Filter::eq("hospital_id", hospital_id),
            Filter::eq("placement_key", placement_key),
            Filter::since("submitted_at", since),
        ];
        let request = self
            .select("reports", token, &filters, "*")
            .query(&[("order", "submitted_at.desc"), ("limit", "1")]);
        let mut rows: Vec<Report> = self.rows("GET /reports (duplicate check)", request).await?;
        Ok(rows.pop())
    }

    async fn insert_report(&self, token: &str, report: &Report) -> BaasResult<()> {
        let request = self.insert("reports", token).json(report);
        self.send("POST /reports", request).await?;
        Ok(())
    }

    async fn replace_report(&self, token: &str, report: &Report) -> BaasResult<()> {
        let request = self
            .patch("reports", token, &[Filter::eq("report_id", report.report_id)])
            .json(report);
        self.send("PATCH /reports", request).await?;
        Ok(())
    }

    async fn patch_flags(&self, token: &str, report_id: Uuid, flags: &ModerationResult) -> BaasResult<()> {
        let request = self
            .patch("reports", token, &[Filter::eq("report_id", report_id)])
            .json(flags);
        self.send("PATCH /reports (flags)", request).await?;
        Ok(())
    }
}

#[async_trait]
impl HospitalRepository for BaasClient {
    async fn get_hospital(&self, token: &str, hospital_id: &str) -> BaasResult<Option<Hospital>> {
        let request = self.select("hospitals", token, &[Filter::eq("hosp_id", hospital_id)], "*");
        self.single_row("GET /hospitals", request).await
    }

    async fn update_departments(
        &self,
        token: &str,
        hospital_id: &str,
        departments: &Departments,
    ) -> BaasResult<()> {
        let request = self
            .patch("hospitals", token, &[Filter::eq("hosp_id", hospital_id)])
            .json(&serde_json::json!({ "departments": departments }));
        self.send("PATCH /hospitals (departments)", request).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackRepository for BaasClient {
    async fn count_recent(&self, token: &str, user_id: &str, since: DateTime<Utc>) -> BaasResult<usize> {
        let filters = [Filter::eq("user_id", user_id), Filter::since("created_at", since)];
        let request = self.select("feedback", token, &filters, "created_at");
        let rows: Vec<serde_json::Value> = self.rows("GET /feedback", request).await?;
        Ok(rows.len())
    }

    async fn insert_feedback(&self, token: &str, entry: &FeedbackEntry) -> BaasResult<()> {
        let request = self.insert("feedback", token).json(entry);
        self.send("POST /feedback", request).await?;
        Ok(())
    }
}
