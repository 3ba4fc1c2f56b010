//! # court-worker -- Background Jobs for the Court Stack
//!
//! - [`RetryDaemon`]: fixed-delay retries of a fallible action.
//! - [`Worker`] and [`JobRunner`]: run a unit of work `times` times, or
//!   forever, `repeat` apart. Failed jobs go to an [`ErrorLog`].
//! - [`HeartbeatWorker`]: advances the ledger's term, the one job the
//!   court needs someone to run continuously.
//!
//! Workers never panic on a failed job. The runner records the failure and
//! carries on with the next job.

pub mod error_log;
pub mod heartbeat;
pub mod job;
pub mod retry;
pub mod runner;

pub use error_log::{ErrorLog, ErrorRecord, MemoryErrorLog, TracingErrorLog};
pub use heartbeat::{HeartbeatWorker, MAX_TRANSITIONS_PER_CALL, SECONDS_BETWEEN_TRIES};
pub use job::{JobContext, Worker};
pub use retry::RetryDaemon;
pub use runner::{JobRunner, JobSchedule, RunSummary};
