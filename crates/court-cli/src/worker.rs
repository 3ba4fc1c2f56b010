//! # Worker Subcommand
//!
//! Long-running background workers. Each job's failure is logged and
//! recorded; it never ends the run or changes the exit code.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use court_worker::{HeartbeatWorker, JobRunner, JobSchedule, TracingErrorLog};

use crate::connect::Court;

/// Arguments for the `court worker` subcommand.
#[derive(Args, Debug)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand, Debug)]
pub enum WorkerCommand {
    /// Advance court terms on a schedule.
    Heartbeat(ScheduleArgs),
}

/// Job schedule flags.
#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Worker instance name used in logs and error records.
    #[arg(long, default_value = "unknown")]
    pub name: String,
    /// Jobs to run; 0 runs until stopped.
    #[arg(long, default_value_t = 1)]
    pub times: u64,
    /// Attempts per job.
    #[arg(long, default_value_t = 1)]
    pub tries: u32,
    /// Seconds to wait between jobs.
    #[arg(long, default_value_t = 0)]
    pub repeat: u64,
}

impl ScheduleArgs {
    pub fn schedule(&self) -> JobSchedule {
        JobSchedule {
            times: (self.times > 0).then_some(self.times),
            tries: self.tries,
            repeat: Duration::from_secs(self.repeat),
        }
    }
}

/// Execute the worker subcommand.
pub async fn run_worker(args: &WorkerArgs, court: &Court) -> Result<u8> {
    match &args.command {
        WorkerCommand::Heartbeat(schedule) => {
            let worker = HeartbeatWorker::new(court.orchestrator.terms().clone());
            let runner = JobRunner::new(
                schedule.name.clone(),
                schedule.schedule(),
                Arc::new(TracingErrorLog),
            );
            let summary = runner.run(&worker).await;
            println!(
                "OK: worker finished ({} succeeded, {} failed)",
                summary.succeeded, summary.failed
            );
        }
    }
    Ok(0)
}
