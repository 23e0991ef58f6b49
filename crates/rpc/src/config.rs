//! Outbound client configuration and retry policy.

use std::time::Duration;

use serde::Deserialize;

use crate::status::Code;

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_retries() -> u32 {
    3
}

/// Configuration for one downstream client.
///
/// Immutable after channel construction; owned by the channel for its
/// lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Host:port of the remote service.
    pub address: String,
    /// Per-attempt deadline, milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry budget on top of the initial attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Plaintext transport instead of TLS.
    #[serde(default)]
    pub insecure: bool,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Bounded-retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum re-attempts after the first call (`retries + 1` total).
    pub retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub backoff_base: Duration,
    /// Status classes eligible for re-attempt.
    pub retryable: Vec<Code>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_base: Duration::from_secs(1),
            retryable: crate::status::RETRYABLE_CODES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn should_retry(&self, code: Code) -> bool {
        self.retryable.contains(&code)
    }

    /// Backoff before re-attempt number `attempt + 1` (zero-based):
    /// `base`, `2*base`, `4*base`, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}
