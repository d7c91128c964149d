//! Request timeout helpers
//!
//! Provides timeout wrappers for backend calls to prevent indefinite hangs.

use super::errors::{BaasError, BaasResult};
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for backend requests (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for moderation completions (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a request with timeout
///
/// # Example
///
/// ```no_run
/// use nurse_reports::baas::timeouts::{with_timeout, DEFAULT_REQUEST_TIMEOUT};
/// # async fn example(client: reqwest::Client) -> Result<(), Box<dyn std::error::Error>> {
///
/// let response = with_timeout(DEFAULT_REQUEST_TIMEOUT, async {
///     Ok(client.get("https://example.com").send().await?)
/// })
/// .await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> BaasResult<T>
where
    F: std::future::Future<Output = BaasResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(BaasError::Timeout(duration)),
    }
}

/// Execute a request with the default timeout
pub async fn with_default_timeout<F, T>(future: F) -> BaasResult<T>
where
    F: std::future::Future<Output = BaasResult<T>>,
{
    with_timeout(DEFAULT_REQUEST_TIMEOUT, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_constants() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT.as_secs(), 10);
        assert_eq!(LONG_OPERATION_TIMEOUT.as_secs(), 30);
    }

    #[tokio::test]
    async fn test_timeout_elapses() {
        let result: BaasResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(matches!(err, BaasError::Timeout(d) if d == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: BaasResult<()> = with_default_timeout(async { Err(BaasError::TooManyRows(3)) }).await;
        assert!(matches!(result, Err(BaasError::TooManyRows(3))));
    }
}
