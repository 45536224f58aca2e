//! Exponential backoff with jitter for transport failures.

use std::time::Duration;

use rand::Rng;

/// Tracks consecutive transport failures and yields the delay before the
/// next attempt. The delay doubles per failure up to a ceiling and resets
/// after any successful call, bounding request storms against a degraded
/// admin server while keeping recovery latency low once it returns.
#[derive(Debug)]
pub struct BackoffPolicy {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            attempt: 0,
        }
    }

    /// Record one more failure and return the delay before the next attempt.
    /// Never exceeds the configured ceiling, jitter included.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        calculate_backoff(self.attempt, self.base_ms, self.max_ms)
    }

    /// Reset after a successful call.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of consecutive failures recorded since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Calculate exponential backoff delay with jitter, capped at `max_ms`.
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay), keeping the ceiling intact
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis((capped_delay + jitter).min(max_ms))
}
