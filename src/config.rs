//! Client configuration.
//!
//! Holds the API base URL, the locale and device descriptors stamped
//! onto every outbound request, and the retry/timeout policy of the
//! request client. The host application constructs one `Config` at
//! startup and hands it to [`crate::RequestClient`].

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default API base URL (development backend).
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Outer request timeout in seconds.
/// Large on purpose: the search endpoint can take a long time while the
/// backend waits on its summarizer.
const REQUEST_TIMEOUT_SECS: u64 = 100;

/// Total attempt budget for timeout retries.
const RETRY_ATTEMPTS: u32 = 3;

/// Delay before the first retry, in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Backoff growth factor after each retry (1000 -> 1500 -> 2250 ...).
const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Descriptors identifying the device, sent as `X-Device-*` headers.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub platform: String,
    pub version: String,
    pub screen: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            platform: "unknown".to_string(),
            version: "0".to_string(),
            screen: "0x0".to_string(),
        }
    }
}

/// Retry policy for timeout failures. Only timeouts are retried;
/// everything else propagates on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS,
            initial_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            multiplier: BACKOFF_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// BCP 47 tag sent as `Accept-Language`.
    pub locale: String,
    pub device: DeviceInfo,
    /// Bounds each dispatched attempt; a retry gets a fresh timeout.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            locale: "en-US".to_string(),
            device: DeviceInfo::default(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_matches_backoff_schedule() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.attempts, 3);
        assert_eq!(retry.initial_delay, Duration::from_millis(1000));
        let second = retry.initial_delay.mul_f64(retry.multiplier);
        assert_eq!(second, Duration::from_millis(1500));
        assert_eq!(second.mul_f64(retry.multiplier), Duration::from_millis(2250));
    }

    #[test]
    fn new_overrides_only_the_url() {
        let config = Config::new("https://api.example.com");
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(100));
    }
}
