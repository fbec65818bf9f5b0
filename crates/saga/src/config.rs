//! Saga timing and remote-call configuration.

use std::num::NonZeroU8;
use std::time::Duration;

/// How often a failed remote call is attempted before the error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: NonZeroU8,
    /// Fixed pause between attempts.
    pub backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: NonZeroU8::MIN,
            backoff: None,
        }
    }
}

/// Deadlines and call limits for one saga instance.
///
/// Reads from environment variables (milliseconds unless noted):
/// - `SAGA_ORDER_TIMEOUT_MS`: payment must be submitted within (default: `10000`)
/// - `SAGA_PAYMENT_TIMEOUT_MS`: payment must be confirmed within (default: `10000`)
/// - `SAGA_POLL_INTERVAL_MS`: payment status poll interval (default: `2000`)
/// - `SAGA_CALL_TIMEOUT_MS`: per remote call limit (default: `5000`)
/// - `SAGA_CALL_ATTEMPTS`: attempts per remote call (default: `1`)
/// - `SAGA_CALL_BACKOFF_MS`: pause between attempts (default: none)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaConfig {
    pub order_timeout: Duration,
    pub payment_timeout: Duration,
    pub poll_interval: Duration,
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
}

impl SagaConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = Self::default();

        Self {
            order_timeout: millis("SAGA_ORDER_TIMEOUT_MS").unwrap_or(defaults.order_timeout),
            payment_timeout: millis("SAGA_PAYMENT_TIMEOUT_MS").unwrap_or(defaults.payment_timeout),
            poll_interval: millis("SAGA_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            call_timeout: millis("SAGA_CALL_TIMEOUT_MS").unwrap_or(defaults.call_timeout),
            retry: RetryPolicy {
                attempts: lookup("SAGA_CALL_ATTEMPTS")
                    .and_then(|v| v.trim().parse::<NonZeroU8>().ok())
                    .unwrap_or(defaults.retry.attempts),
                backoff: millis("SAGA_CALL_BACKOFF_MS").or(defaults.retry.backoff),
            },
        }
    }
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            order_timeout: Duration::from_secs(10),
            payment_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            call_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}
