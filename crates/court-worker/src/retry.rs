//! # Retry Daemon
//!
//! Repeats a fallible async action with a fixed pause between attempts.
//! There is no jitter and no growth: attempt `n + 1` starts `delay` after
//! attempt `n` failed. The final failure is handed back unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDaemon {
    max_attempts: u32,
    delay: Duration,
}

impl RetryDaemon {
    /// A policy of `max_attempts` tries spaced `delay` apart. Zero attempts
    /// is treated as one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action(attempt)` until it succeeds or `max_attempts` is spent.
    /// `attempt` counts from 1.
    pub async fn run<T, E, F, Fut>(&self, mut action: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match action(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::error!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "giving up"
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed, retrying in {:?}",
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_means_one() {
        let daemon = RetryDaemon::new(0, Duration::from_secs(1));
        assert_eq!(daemon.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_sleeps() {
        let daemon = RetryDaemon::new(1, Duration::from_secs(60));
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = daemon.run(|_| async { Err("down".into()) }).await;

        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
