//! Defaults and explicit configuration for the request layer.
//!
//! # Precedence
//! Transport settings are resolved field by field: per-call
//! `TransportOptions` win over the client-level `TransportOptions`, which win
//! over the defaults below. `use_tls` falls back to the URL scheme.

use std::time::Duration;

use url::Url;

/// `user-agent` sent unless the caller overrides it.
pub const DEFAULT_USER_AGENT: &str = concat!("jpush-api-rust-client/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_RETRY_TIMES: u32 = 3;

/// Delay available to policies that want to pause between attempts. The
/// default policy retries immediately.
pub const RETRY_SLEEP_TIME: Duration = Duration::from_secs(3);

/// Headers present on every request before caller overrides are applied.
pub const DEFAULT_HEADERS: [(&str, &str); 4] = [
    ("user-agent", DEFAULT_USER_AGENT),
    ("accept", "application/json"),
    ("content-type", "application/json"),
    ("connection", "close"),
];

/// Low-level connection overrides. `None` means "inherit".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub use_tls: Option<bool>,
    pub open_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl TransportOptions {
    pub fn with_use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = Some(use_tls);
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Fill every unset field of `self` from `base`.
    pub fn merged_over(&self, base: &TransportOptions) -> TransportOptions {
        TransportOptions {
            use_tls: self.use_tls.or(base.use_tls),
            open_timeout: self.open_timeout.or(base.open_timeout),
            read_timeout: self.read_timeout.or(base.read_timeout),
        }
    }

    /// Resolve against the defaults for a request to `url`.
    pub fn resolve(&self, url: &Url) -> ConnectOptions {
        ConnectOptions {
            use_tls: self.use_tls.unwrap_or(url.scheme() == "https"),
            open_timeout: self.open_timeout.unwrap_or(DEFAULT_OPEN_TIMEOUT),
            read_timeout: self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
        }
    }
}

/// Fully resolved connection parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub use_tls: bool,
    pub open_timeout: Duration,
    pub read_timeout: Duration,
}

/// Bounded retry policy for timeouts and truncated responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_TIMES,
            retry_delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Client-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub transport: TransportOptions,
    pub retry: RetryPolicy,
}
