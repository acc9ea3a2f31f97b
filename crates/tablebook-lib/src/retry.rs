//! Bounded retry with exponential backoff for transient storage failures.

use std::time::Duration;

/// Environment variable overriding [`RetryPolicy::max_attempts`].
pub const ENV_MAX_ATTEMPTS: &str = "BOOKING_MAX_ATTEMPTS";

/// Environment variable overriding [`RetryPolicy::base_delay`] (milliseconds).
pub const ENV_BASE_DELAY_MS: &str = "BOOKING_RETRY_BASE_MS";

/// How often, and how patiently, the coordinator retries storage calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 behave as 1.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Growth factor applied per further retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately; intended for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Create a policy from `BOOKING_MAX_ATTEMPTS` and `BOOKING_RETRY_BASE_MS`.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`RetryPolicy::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_attempts = lookup(ENV_MAX_ATTEMPTS)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(defaults.max_attempts);

        let base_delay = lookup(ENV_BASE_DELAY_MS)
            .and_then(|value| value.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay);

        Self {
            max_attempts,
            base_delay,
            ..defaults
        }
    }

    /// Effective attempt budget (never zero).
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given (1-indexed) failed attempt:
    /// `base_delay * multiplier^(attempts - 1)`.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
