//! Client settings: endpoint, credentials, timeouts and retry policy.

use std::time::Duration;
use url::Url;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.bexio.com/";

/// Everything a [`crate::BexioClient`] needs to reach the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; endpoint paths such as `2.0/kb_invoice` are joined onto it.
    pub base_url: Url,
    /// Personal access token sent as a bearer credential.
    pub api_token: String,
    pub timeout: Duration,
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    /// 30 second timeout, default retry policy.
    pub fn new(base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_token: api_token.into(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// Exponential backoff for transient failures.
///
/// Non-idempotent requests (POST) are only retried on 429, where the server
/// guarantees the request was not processed.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first; zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Upper bound for any single wait.
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Statuses retried for idempotent requests.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Wait before retry number `attempt` (zero based).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    pub fn should_retry_status(&self, status: u16, idempotent: bool) -> bool {
        if !idempotent {
            return status == 429;
        }
        self.retry_on_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let config = RetryConfig::default();

        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let config = RetryConfig {
            max_backoff: Duration::from_millis(500),
            ..Default::default()
        };

        assert_eq!(config.backoff_for_attempt(10), Duration::from_millis(500));
    }

    #[test]
    fn test_should_retry_status() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(429, true));
        assert!(config.should_retry_status(500, true));
        assert!(config.should_retry_status(503, true));
        assert!(!config.should_retry_status(400, true));
        assert!(!config.should_retry_status(404, true));
    }

    #[test]
    fn test_non_idempotent_only_retries_rate_limit() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(429, false));
        assert!(!config.should_retry_status(500, false));
        assert!(!config.should_retry_status(503, false));
    }

    #[test]
    fn test_client_config_defaults() {
        let url = Url::parse(DEFAULT_BASE_URL).unwrap();
        let config = ClientConfig::new(url.clone(), "token");

        assert_eq!(config.base_url, url);
        assert_eq!(config.api_token, "token");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_config.max_retries, 2);
    }

    #[test]
    fn test_retry_config_no_retry() {
        let config = RetryConfig::no_retry();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_backoff, Duration::from_millis(200));
    }
}
