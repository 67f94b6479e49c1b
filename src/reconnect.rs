//! Reconnect backoff policy.
//!
//! The link never reconnects unless the policy is enabled. When it is, a
//! `Failed` or `Closed` transition that the caller did not request schedules
//! another connect after `base * 2^(attempt - 1)`, capped at `max_delay`,
//! plus up to `jitter` of random delay.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default base delay.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Default delay cap.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default jitter bound.
pub const DEFAULT_JITTER_MS: u64 = 250;

/// Exponential backoff parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectPolicy {
    /// Whether automatic reconnect is on.
    pub enabled: bool,
    /// Delay before the first attempt.
    pub base_delay_ms: u64,
    /// Upper bound on the computed delay (before jitter).
    pub max_delay_ms: u64,
    /// Attempts before giving up. `0` retries forever.
    pub max_attempts: u32,
    /// Upper bound on added random delay.
    pub jitter_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            jitter_ms: DEFAULT_JITTER_MS,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never reconnects.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An enabled policy with default parameters.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Check if `attempt` (1-based) is allowed.
    pub fn allows(&self, attempt: u32) -> bool {
        self.enabled && attempt > 0 && (self.max_attempts == 0 || attempt <= self.max_attempts)
    }

    /// Backoff before `attempt` (1-based), without jitter.
    ///
    /// Returns `None` when the policy is disabled or attempts are exhausted.
    pub fn base_delay(&self, attempt: u32) -> Option<Duration> {
        if !self.allows(attempt) {
            return None;
        }
        // Shift is capped so the multiplication cannot overflow.
        let shift = attempt.saturating_sub(1).min(30);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms);
        Some(Duration::from_millis(delay_ms))
    }

    /// Backoff before `attempt` with jitter drawn from `rng`.
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Option<Duration> {
        let base = self.base_delay(attempt)?;
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..=self.jitter_ms)
        };
        Some(base + Duration::from_millis(jitter))
    }

    /// Backoff before `attempt` with jitter from the thread RNG.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        self.delay_with(attempt, &mut rand::thread_rng())
    }
}
