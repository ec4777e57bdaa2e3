//! Client construction options.
//!
//! `ClientConfig` carries the application identity plus the transport
//! tuning knobs. The library never reads the environment; callers build the
//! config explicitly and hand it to [`Client::new`](crate::Client::new).

use std::time::Duration;

use crate::auth::Credentials;
use crate::error::Result;

/// Per-call HTTP timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Attempts made for idempotent calls and for logins before giving up.
const DEFAULT_RETRY_COUNT: u32 = 3;

/// First backoff delay; doubled after each failed attempt.
const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Role requested in the identity token. Backend services act as admin.
const DEFAULT_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub app_key: String,
    pub app_secret: String,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_backoff: Duration,
    pub role: Option<String>,
    pub user_id: Option<i64>,
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            role: Some(DEFAULT_ROLE.to_string()),
            user_id: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Role claimed in the identity token; `None` omits the claim.
    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    /// Act on behalf of a specific app user.
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Validate the identity part of the config.
    pub(crate) fn credentials(&self) -> Result<Credentials> {
        Credentials::new(&self.host, &self.app_key, &self.app_secret)
    }

    /// At least one attempt is always made.
    pub(crate) fn attempts(&self) -> u32 {
        self.retry_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://app.franklychat.com", "key", "secret");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.role.as_deref(), Some("admin"));
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::new("https://app.franklychat.com", "key", "secret")
            .with_timeout(Duration::from_secs(5))
            .with_retry_count(0)
            .with_role(None)
            .with_user_id(42);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.attempts(), 1);
        assert!(config.role.is_none());
        assert_eq!(config.user_id, Some(42));
    }
}
