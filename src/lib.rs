//! Ratewise ingests heterogeneous, untrusted merchant documents — legacy
//! processing statements, pricing-comparison spreadsheets, proposal PDFs,
//! scans — and produces one normalized record of current card-processing
//! costs plus proposed-pricing savings projections.
//!
//! Pipeline, strictly forward: raw files → decoded content → classification
//! → per-type extraction (possibly chunked page by page) → merge → validate
//! → canonical [`models::MergedResult`]. The job orchestrator is the only
//! component with side effects; every other stage is a pure function of its
//! inputs plus the injected extraction capability.

pub mod capability;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use capability::{ExtractionCapability, HttpCapability, PromptPart};
pub use config::{PipelineConfig, SourcePrecedence};
pub use models::{Classification, DocumentKind, MergedResult, UploadedFile};
pub use pipeline::job::{JobOrchestrator, JobOutcome, JobRequest, JobWorker};
pub use storage::{FileStore, LocalFileStore};

/// Initialize tracing from `RUST_LOG`, defaulting to `info`. Intended for
/// binaries and examples embedding the pipeline; libraries should leave
/// subscriber installation to the host.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
