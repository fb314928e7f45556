//! HTTP transport with an optional bounded retry policy.

use crate::error::{ArmoryError, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_BACKOFF_MS: u64 = 30_000;

/// How many times a failed request is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one; 0 disables retrying
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every further one
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let computed = self
            .backoff_base_ms
            .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
        Duration::from_millis(computed.min(MAX_BACKOFF_MS))
    }
}

/// Runs `operation`, repeating it on retryable errors.
///
/// With retrying disabled the first error is returned as is. Once a positive
/// retry budget is exhausted the result is [`ArmoryError::Timeout`].
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() || policy.max_retries == 0 => return Err(err),
            Err(err) => {
                if attempt >= policy.max_retries {
                    warn!(attempts = attempt + 1, error = %err, "Giving up on request");
                    return Err(ArmoryError::Timeout {
                        attempts: attempt + 1,
                    });
                }
                attempt += 1;
                let delay = policy.delay(attempt);
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Issues GET requests with the configured identity and timeout
#[derive(Debug, Clone)]
pub struct Transport {
    http_client: Client,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(user_agent: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { http_client, retry })
    }

    /// Fetch the body at `url`. Non-success statuses are errors.
    pub async fn http_get(&self, url: &str) -> Result<Vec<u8>> {
        retry_with_backoff(self.retry, || self.get_once(url)).await
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Making request to: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn connect_error() -> ArmoryError {
        let err = Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        ArmoryError::Network(err)
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 50,
            backoff_base_ms: 1_000,
        };
        assert_eq!(policy.delay(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay(40), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(policy(3), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(connect_error().await)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_time_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<()> = retry_with_backoff(policy(2), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(connect_error().await)
            }
        })
        .await;

        assert!(matches!(result, Err(ArmoryError::Timeout { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_service_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<()> = retry_with_backoff(policy(5), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(ArmoryError::CharacterNotFound)
            }
        })
        .await;

        assert!(matches!(result, Err(ArmoryError::CharacterNotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_returns_network_error() {
        let result: Result<()> = retry_with_backoff(RetryPolicy::none(), || async {
            Err(connect_error().await)
        })
        .await;

        assert!(matches!(result, Err(ArmoryError::Network(_))));
    }
}
