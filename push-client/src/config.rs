//! Client configuration.

use std::time::Duration;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.pushover.net/1";

/// Requests allowed in flight at once, per client.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Attempts per request, counting the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Per-request HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for [`PushClient`](crate::PushClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Requests allowed in flight at once.
    pub max_concurrent: usize,
    /// Attempts per request, counting the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Set the API root.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the number of attempts per request.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the number of requests allowed in flight.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_user_agent() -> String {
    format!(
        "push/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.base_url, "https://api.pushover.net/1");
        assert_eq!(cfg.max_concurrent, 2);
        assert_eq!(cfg.max_attempts, 2);
        assert_eq!(cfg.retry_delay, Duration::from_secs(5));
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert!(cfg.user_agent.starts_with("push/"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let cfg = ClientConfig::default().with_base_url("http://localhost:8080/1/");
        assert_eq!(cfg.base_url, "http://localhost:8080/1");
    }
}
