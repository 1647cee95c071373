//! Client configuration

use std::time::Duration;

use shared::RetryPolicy;

/// Admin client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Session access token sent as `Authorization: Bearer`
    pub token: Option<String>,

    /// Timeout for calls that are not retried
    pub timeout: Duration,

    /// Retry policy for order cancellation
    pub cancel_retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
            cancel_retry: RetryPolicy::default(),
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel_retry(mut self, policy: RetryPolicy) -> Self {
        self.cancel_retry = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://localhost:8080").with_token("t");
        assert_eq!(config.token.as_deref(), Some("t"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cancel_retry, RetryPolicy::default());
    }
}
