//! Job orchestration.
//!
//! One job = one sequential pass: classify → route → extract → merge →
//! validate. The orchestrator is the only component with side effects
//! (progress and terminal reporting); everything upstream is a pure
//! function of its inputs plus the extraction capability.

pub mod sinks;
pub mod orchestrator;
pub mod worker;

pub use sinks::*;
pub use orchestrator::*;
pub use worker::*;

use thiserror::Error;

use crate::models::MergedResult;

/// Errors that cross the job boundary. Everything else is absorbed into
/// warnings on a completed result.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("no files to parse")]
    NoFiles,

    /// Extraction capability unreachable or unauthenticated. No partial
    /// result is produced.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Terminal state of a job: always completed with a result (possibly
/// `needs_review`) or failed with one human-readable message — never
/// "succeeded with silent data loss".
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(MergedResult),
    Failed(String),
}

impl JobOutcome {
    pub fn as_completed(&self) -> Option<&MergedResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed(_) => None,
        }
    }
}
