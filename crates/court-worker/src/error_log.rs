//! # Error Log
//!
//! Failed jobs are recorded through an [`ErrorLog`] sink so an operator can
//! find them after the fact. [`TracingErrorLog`] writes each record as a
//! structured `error` event; [`MemoryErrorLog`] keeps records in process
//! for tests and one-shot runs that report at exit.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// One failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    /// Where the failure happened, e.g. `Worker 'heartbeat' job #3`.
    pub context: String,
    /// Display of the top-level error.
    pub message: String,
    /// Display of each `source()` below the top-level error, outermost first.
    pub causes: Vec<String>,
}

impl ErrorRecord {
    pub fn new(context: impl Into<String>, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            context: context.into(),
            message: error.to_string(),
            causes,
        }
    }
}

/// Sink for failed-job records.
pub trait ErrorLog: Send + Sync {
    fn record(&self, record: ErrorRecord);
}

/// Emits each record as a tracing `error` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn record(&self, record: ErrorRecord) {
        tracing::error!(
            id = %record.id,
            at = %record.at.to_rfc3339(),
            context = %record.context,
            causes = ?record.causes,
            "{}",
            record.message
        );
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryErrorLog {
    records: Mutex<Vec<ErrorRecord>>,
}

impl MemoryErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records.lock().clone()
    }
}

impl ErrorLog for MemoryErrorLog {
    fn record(&self, record: ErrorRecord) {
        self.records.lock().push(record);
    }
}
