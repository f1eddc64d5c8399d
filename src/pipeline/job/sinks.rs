//! Progress and completion sinks.
//!
//! The pipeline's only externally observable signals. Implementations must
//! be cheap and safe to call frequently; the orchestrator reports after
//! every stage and, within chunked parsing, after every page.

use std::sync::Mutex;

use uuid::Uuid;

use super::JobOutcome;

pub trait ProgressSink: Send + Sync {
    fn report_progress(&self, job_id: Uuid, percent: u8, message: &str);
}

pub trait CompletionSink: Send + Sync {
    fn report_terminal(&self, job_id: Uuid, outcome: &JobOutcome);
}

/// Sink that forwards everything to structured logs.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report_progress(&self, job_id: Uuid, percent: u8, message: &str) {
        tracing::info!(job_id = %job_id, percent, message, "job progress");
    }
}

impl CompletionSink for TracingSink {
    fn report_terminal(&self, job_id: Uuid, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed(result) => tracing::info!(
                job_id = %job_id,
                status = result.status.as_str(),
                warnings = result.warnings.len(),
                "job completed"
            ),
            JobOutcome::Failed(message) => {
                tracing::error!(job_id = %job_id, %message, "job failed")
            }
        }
    }
}

/// Recording sink for tests: captures every progress call and terminal
/// report in memory.
#[derive(Default)]
pub struct MemorySink {
    pub progress: Mutex<Vec<(u8, String)>>,
    pub terminals: Mutex<Vec<JobOutcome>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.progress
            .lock()
            .expect("progress lock poisoned")
            .iter()
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn last_terminal(&self) -> Option<JobOutcome> {
        self.terminals
            .lock()
            .expect("terminal lock poisoned")
            .last()
            .cloned()
    }
}

impl ProgressSink for MemorySink {
    fn report_progress(&self, _job_id: Uuid, percent: u8, message: &str) {
        self.progress
            .lock()
            .expect("progress lock poisoned")
            .push((percent, message.to_string()));
    }
}

impl CompletionSink for MemorySink {
    fn report_terminal(&self, _job_id: Uuid, outcome: &JobOutcome) {
        self.terminals
            .lock()
            .expect("terminal lock poisoned")
            .push(outcome.clone());
    }
}
