//! Backoff policy for read-only ledger and index requests.
//!
//! View calls and index queries are resent after a transport failure;
//! mutating submissions never come through here, since a resend after a
//! lost response could land the same transaction twice.

use std::time::Duration;

/// How often, and how far apart, a failed read is resent.
///
/// The delay doubles on every retry: with the defaults a read is tried at
/// most four times, 200 ms, 400 ms and 800 ms apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetry {
    /// Resends after the first attempt. 0 sends each read once.
    pub retries: u32,
    /// Pause before the first resend.
    pub base_delay: Duration,
}

impl Default for ReadRetry {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl ReadRetry {
    /// Send every read exactly once.
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Pause before resend number `retry` (0-based). Saturates instead of
    /// overflowing for large retry counts.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Send a read-only HTTP request, resending on transport failure.
    ///
    /// Only [`reqwest::Error`]s trigger a resend. A response with an error
    /// status is returned as-is for the caller to classify.
    pub(crate) async fn send<F, Fut>(
        &self,
        operation: &str,
        f: F,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut retry = 0;
        loop {
            match f().await {
                Ok(resp) => return Ok(resp),
                Err(e) if retry < self.retries => {
                    let delay = self.delay(retry);
                    retry += 1;
                    tracing::warn!(
                        operation,
                        retry,
                        retries = self.retries,
                        "read failed, resending in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
