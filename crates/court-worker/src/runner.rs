//! # Job Runner
//!
//! Runs a [`Worker`] a fixed number of times, or forever, pausing `repeat`
//! between jobs whatever their outcome. A failed job is logged and handed
//! to the [`ErrorLog`] sink; it never stops the jobs after it.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error_log::{ErrorLog, ErrorRecord};
use crate::job::{JobContext, Worker};

/// How many jobs to run and how far apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    /// Number of jobs; `None` runs until the process is stopped.
    pub times: Option<u64>,
    /// Attempts a worker may make within one job.
    pub tries: u32,
    /// Pause after each job that is followed by another.
    pub repeat: Duration,
}

impl Default for JobSchedule {
    fn default() -> Self {
        Self {
            times: Some(1),
            tries: 1,
            repeat: Duration::ZERO,
        }
    }
}

/// Job outcomes of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: u64,
    pub failed: u64,
}

/// Drives a worker on a [`JobSchedule`].
pub struct JobRunner<E: ?Sized> {
    name: String,
    schedule: JobSchedule,
    errors: Arc<E>,
}

impl<E: ?Sized> std::fmt::Debug for JobRunner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl<E: ErrorLog + ?Sized> JobRunner<E> {
    /// `name` identifies this runner instance in logs and error records.
    pub fn new(name: impl Into<String>, schedule: JobSchedule, errors: Arc<E>) -> Self {
        Self {
            name: name.into(),
            schedule,
            errors,
        }
    }

    pub fn schedule(&self) -> &JobSchedule {
        &self.schedule
    }

    pub async fn run<W: Worker + ?Sized>(&self, worker: &W) -> RunSummary {
        let mut summary = RunSummary::default();
        match self.schedule.times {
            Some(times) => tracing::info!(
                worker = %self.name,
                kind = worker.name(),
                times,
                "starting worker"
            ),
            None => tracing::info!(
                worker = %self.name,
                kind = worker.name(),
                "starting worker, running until stopped"
            ),
        }

        let mut job: u64 = 1;
        while self.schedule.times.map_or(true, |times| job <= times) {
            let ctx = JobContext {
                worker: self.name.clone(),
                job,
                tries: self.schedule.tries,
            };
            let last = self.schedule.times == Some(job);

            tracing::info!(worker = %self.name, job, "creating job #{job}");
            match worker.run(&ctx).await {
                Ok(()) => {
                    summary.succeeded += 1;
                    tracing::info!(
                        worker = %self.name,
                        job,
                        "Job #{job} finished successfully{}",
                        next_run_hint(self.schedule.repeat, last)
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        worker = %self.name,
                        job,
                        error = %e,
                        "Job #{job} exited with error"
                    );
                    self.errors.record(ErrorRecord::new(ctx.label(), &e));
                }
            }

            if last {
                break;
            }
            if !self.schedule.repeat.is_zero() {
                tokio::time::sleep(self.schedule.repeat).await;
            }
            job = job.saturating_add(1);
        }

        tracing::info!(
            worker = %self.name,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "worker finished"
        );
        summary
    }
}

fn next_run_hint(repeat: Duration, last: bool) -> String {
    if last || repeat.is_zero() {
        return String::new();
    }
    let minutes = repeat.as_secs_f64() / 60.0;
    format!(", will get back in {minutes} minutes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_only_when_another_job_follows() {
        let five = Duration::from_secs(300);
        assert_eq!(next_run_hint(five, false), ", will get back in 5 minutes");
        assert_eq!(next_run_hint(five, true), "");
        assert_eq!(next_run_hint(Duration::ZERO, false), "");
        assert_eq!(
            next_run_hint(Duration::from_secs(30), false),
            ", will get back in 0.5 minutes"
        );
    }
}
