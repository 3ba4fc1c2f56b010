//! # Heartbeat Worker
//!
//! Keeps the court's clock moving: each job advances at most
//! [`MAX_TRANSITIONS_PER_CALL`] owed terms, retrying a failed heartbeat
//! [`SECONDS_BETWEEN_TRIES`] seconds apart up to the job's `tries`.

use std::time::Duration;

use async_trait::async_trait;
use court_arbitration::{ArbitrationError, TermAdvancer};
use court_client::Ledger;

use crate::job::{JobContext, Worker};
use crate::retry::RetryDaemon;

/// Term transitions requested per heartbeat submission.
pub const MAX_TRANSITIONS_PER_CALL: u64 = 2;

/// Pause between heartbeat attempts within one job.
pub const SECONDS_BETWEEN_TRIES: u64 = 3;

/// Advances court terms once per job.
pub struct HeartbeatWorker<L: ?Sized> {
    terms: TermAdvancer<L>,
    delay: Duration,
}

impl<L: ?Sized> std::fmt::Debug for HeartbeatWorker<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatWorker")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<L: Ledger + ?Sized> HeartbeatWorker<L> {
    pub fn new(terms: TermAdvancer<L>) -> Self {
        Self {
            terms,
            delay: Duration::from_secs(SECONDS_BETWEEN_TRIES),
        }
    }

    /// Override the pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl<L: Ledger + ?Sized> Worker for HeartbeatWorker<L> {
    type Error = ArbitrationError;

    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn run(&self, ctx: &JobContext) -> Result<(), ArbitrationError> {
        let daemon = RetryDaemon::new(ctx.tries, self.delay);
        let transitions = daemon
            .run(|attempt| {
                tracing::info!(
                    worker = %ctx.worker,
                    job = ctx.job,
                    attempt,
                    "transitioning up to {MAX_TRANSITIONS_PER_CALL} terms"
                );
                self.terms.heartbeat(Some(MAX_TRANSITIONS_PER_CALL))
            })
            .await?;
        tracing::info!(worker = %ctx.worker, job = ctx.job, transitions, "transitioned court terms");
        Ok(())
    }
}
