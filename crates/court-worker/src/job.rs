//! Worker contract: one unit of background work, run once per job.

use async_trait::async_trait;

/// What a worker knows about the job it is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Worker instance name, used in logs and error records.
    pub worker: String,
    /// Job number, counting from 1.
    pub job: u64,
    /// Attempts the worker may make within this job.
    pub tries: u32,
}

impl JobContext {
    /// Context string attached to error records for this job.
    pub fn label(&self) -> String {
        format!("Worker '{}' job #{}", self.worker, self.job)
    }
}

/// A background worker driven by [`crate::JobRunner`].
#[async_trait]
pub trait Worker: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short kind name, e.g. `heartbeat`.
    fn name(&self) -> &str;

    /// Run one job.
    async fn run(&self, ctx: &JobContext) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_worker_and_job() {
        let ctx = JobContext {
            worker: "terms-1".into(),
            job: 4,
            tries: 3,
        };
        assert_eq!(ctx.label(), "Worker 'terms-1' job #4");
    }
}
