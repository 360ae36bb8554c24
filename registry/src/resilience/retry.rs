//! Retry policy with exponential backoff and cryptographic jitter

use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;

/// Retry budget and backoff shape for upstream calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base delay; attempt `k` waits `min(base * 2^(k-1) + jitter,
    /// base * 2^max)` with jitter drawn from `[0, base)`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before retrying after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp = base_ms.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(32));
        let cap = base_ms.saturating_mul(1u64 << u64::from(self.max_attempts).min(32));
        let jitter = if base_ms > 0 {
            OsRng.gen_range(0..base_ms)
        } else {
            0
        };
        Duration::from_millis(exp.saturating_add(jitter).min(cap))
    }
}
