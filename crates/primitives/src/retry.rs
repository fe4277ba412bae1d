//! Retry policy for CAS write loops
//!
//! The default policy makes 4 attempts back to back with no delay. Backoff
//! and jitter are opt-in: `with_backoff` sleeps `base * 2^attempt`
//! milliseconds (capped at `max`) between attempts, and `with_jitter`
//! replaces each delay with a uniform pick from `[0, delay]`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempts made by the default policy
pub const DEFAULT_MAX_ATTEMPTS: usize = 4;

/// Configuration for CAS retry behavior
///
/// # Example
/// ```ignore
/// let retry = RetryConfig::default()
///     .with_max_attempts(8)
///     .with_backoff(1, 50)
///     .with_jitter(true);
/// let users = CollectionConfig::new("user", "users", User::default()).with_retry(retry);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts before giving up (values below 1 are treated as 1)
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
    /// Randomize each delay within `[0, delay]`
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set total number of attempts
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Enable exponential backoff between attempts
    pub fn with_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Effective attempt count
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Upper bound of the delay after the given (0-based) failed attempt
    pub fn backoff_ceiling(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Delay to wait after the given (0-based) failed attempt
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        if !self.jitter || ceiling.is_zero() {
            return ceiling;
        }
        let ms = ceiling.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=ms))
    }
}
