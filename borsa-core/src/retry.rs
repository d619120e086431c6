//! Bounded exponential backoff.
//!
//! The wait after the n-th failed attempt is `multiplier * 2^(n-1)` seconds,
//! clamped to `[min_delay, max_delay]`. No wait follows the final attempt.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Blocking pause between attempts or batches.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that only records requested durations.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// Failure after every attempt was used.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryError<E: fmt::Display> {
    pub attempts: u32,
    pub last: E,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 5 attempts, multiplier 2, waits clamped to 5..=120 seconds.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: 2.0,
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(62) as i32;
        let raw = self.multiplier * 2f64.powi(exp);
        let secs = raw
            .max(self.min_delay.as_secs_f64())
            .min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Every wait the policy would take if all attempts fail.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts.max(1))
            .map(|n| self.delay_after(n))
            .collect()
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// on exhaustion.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, RetryError<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    return Err(RetryError {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "attempt failed, backing off"
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
