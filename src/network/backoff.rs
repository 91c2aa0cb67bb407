//! Capped exponential backoff between request attempts

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Tracks attempts for one request and paces retries
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

/// Returned once every attempt has been spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetriesExhausted;

impl std::fmt::Display for RetriesExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "maximum request attempts exhausted")
    }
}

impl std::error::Error for RetriesExhausted {}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            max_attempts,
            attempt: 0,
        }
    }

    /// Attempts consumed so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Record a failed attempt and wait before the next one.
    /// Errors when no attempts remain.
    pub async fn wait(&mut self) -> Result<(), RetriesExhausted> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return Err(RetriesExhausted);
        }

        let delay = self.delay_for(self.attempt);
        debug!(
            "Retry attempt {} of {} in {:?}",
            self.attempt + 1,
            self.max_attempts,
            delay
        );

        if !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(())
    }

    /// Delay before attempt `attempt + 1`, with up to 25% jitter
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self
            .initial_delay
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_delay);
        if base.is_zero() {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0.0..0.25);
        base.mul_f64(1.0 + jitter).min(self.max_delay)
    }
}
