//! Reconnect backoff policy.
//!
//! Exponential backoff with a bounded attempt count: attempt `n` waits
//! `base_delay * 2^(n-1)`. With the production defaults (1 s base, 5
//! attempts) the schedule is 1 s, 2 s, 4 s, 8 s, 16 s, after which the
//! client gives up until a fresh manual connect.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default base delay before the first retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default maximum number of automatic retry attempts.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Exponential reconnect schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before attempt 1; doubles per attempt.
    base_delay: Duration,
    /// Attempts after which the client stops retrying.
    max_attempts: u32,
}

impl ReconnectPolicy {
    /// Creates a policy with explicit base delay and attempt bound.
    #[inline]
    #[must_use]
    pub const fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Returns the base delay.
    #[inline]
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Returns the maximum attempt count.
    #[inline]
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the wait before the given retry attempt (1-based).
    ///
    /// Attempt 0 is treated as attempt 1.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Returns `true` once `attempts` retries have been used up.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

// ============================================================================
// Tests
// ============================================================================
