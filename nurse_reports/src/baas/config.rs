//! Backend-as-a-service connection configuration.

use std::time::Duration;

/// Connection settings for the hosted Postgres REST + auth provider
#[derive(Debug, Clone)]
pub struct BaasConfig {
    /// Project base URL without trailing slash, e.g. `https://<ref>.supabase.co`
    pub api_url: String,

    /// Static API key sent as the `apikey` header on every request
    pub anon_key: String,

    /// Upper bound for any single request
    pub request_timeout: Duration,
}

impl BaasConfig {
    /// Create a configuration for a local development stack
    ///
    /// Uses `http://localhost:54321`, the default port of the provider's CLI.
    pub fn development(anon_key: impl Into<String>) -> Self {
        Self {
            api_url: "http://localhost:54321".to_string(),
            anon_key: anon_key.into(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Endpoint for a table-style REST resource
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Endpoint under the auth service
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }
}
