use std::time::Duration;

use crate::retry::RetryPolicy;

/// Production ParseHub endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.parsehub.com/api/";

/// Seconds between status fetches for a watched run.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Seconds before a single HTTP request is abandoned.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Seconds `shutdown` waits for watch tasks to exit.
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Client and tracker configuration.
///
/// All fields have defaults suitable for the public ParseHub API. Load
/// overrides from the environment with [`TrackerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Base URL of the REST API, with or without a trailing slash.
    pub base_url: String,
    /// Fixed delay between status fetches of a watched run.
    pub poll_interval: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// How long `shutdown` waits for watch tasks.
    pub shutdown_timeout: Duration,
    /// What a watch does when a status fetch fails.
    pub retry: RetryPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                         |
    /// |----------------------------------|---------------------------------|
    /// | `PARSEHUB_BASE_URL`              | `https://www.parsehub.com/api/` |
    /// | `PARSEHUB_POLL_INTERVAL_SECS`    | `10`                            |
    /// | `PARSEHUB_REQUEST_TIMEOUT_SECS`  | `30`                            |
    /// | `PARSEHUB_SHUTDOWN_TIMEOUT_SECS` | `5`                             |
    /// | `PARSEHUB_FETCH_RETRIES`         | `0` (fail-stop)                 |
    /// | `PARSEHUB_RETRY_MAX_DELAY_SECS`  | `60`                            |
    ///
    /// Values that fail to parse fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str| -> Option<Duration> {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        let base_url = lookup("PARSEHUB_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        // A zero interval would turn the watch into a busy loop.
        let poll_interval = secs("PARSEHUB_POLL_INTERVAL_SECS")
            .filter(|d| !d.is_zero())
            .unwrap_or(defaults.poll_interval);

        let request_timeout = secs("PARSEHUB_REQUEST_TIMEOUT_SECS")
            .filter(|d| !d.is_zero())
            .unwrap_or(defaults.request_timeout);

        let shutdown_timeout =
            secs("PARSEHUB_SHUTDOWN_TIMEOUT_SECS").unwrap_or(defaults.shutdown_timeout);

        let max_retries = lookup("PARSEHUB_FETCH_RETRIES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.retry.max_retries);

        let max_delay = secs("PARSEHUB_RETRY_MAX_DELAY_SECS").unwrap_or(defaults.retry.max_delay);

        Self {
            base_url,
            poll_interval,
            request_timeout,
            shutdown_timeout,
            retry: RetryPolicy {
                max_retries,
                max_delay,
                ..defaults.retry
            },
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
