//! Background job worker.
//!
//! A single worker thread drains submitted jobs in order. Independent jobs
//! share no mutable state — each owns its files, decoded buffers and
//! progress record — so callers wanting concurrency run multiple workers
//! over disjoint queues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use super::orchestrator::{JobOrchestrator, JobRequest};

/// Receive poll granularity, for responsive shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle for the worker thread. Supports graceful shutdown via
/// [`JobWorker::shutdown`] or automatic cleanup on `Drop`; a job already
/// running completes before the thread exits.
pub struct JobWorker {
    sender: Option<mpsc::Sender<JobRequest>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl JobWorker {
    pub fn spawn(orchestrator: Arc<JobOrchestrator>) -> Self {
        let (sender, receiver) = mpsc::channel::<JobRequest>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = std::thread::spawn(move || {
            tracing::info!("job worker started");
            loop {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(request) => {
                        let _ = orchestrator.run(&request);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::info!("job worker shutting down");
        });

        Self {
            sender: Some(sender),
            shutdown,
            handle: Some(handle),
        }
    }

    /// Enqueue a job. Returns the request when the worker has shut down.
    pub fn submit(&self, request: JobRequest) -> Result<(), JobRequest> {
        match &self.sender {
            Some(sender) => sender.send(request).map_err(|e| e.0),
            None => Err(request),
        }
    }

    /// Request graceful shutdown and wait for the thread to exit.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.sender = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for JobWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::capability::MockCapability;
    use crate::config::PipelineConfig;
    use crate::pipeline::decode::LopdfSplitter;
    use crate::pipeline::job::{JobOutcome, MemorySink};
    use crate::storage::MemoryFileStore;

    fn orchestrator(sink: Arc<MemorySink>) -> Arc<JobOrchestrator> {
        Arc::new(JobOrchestrator::new(
            Arc::new(MockCapability::new("unused")),
            Arc::new(MemoryFileStore::new()),
            Arc::new(LopdfSplitter),
            sink.clone(),
            sink,
            PipelineConfig::default(),
        ))
    }

    #[test]
    fn worker_processes_submitted_job() {
        let sink = Arc::new(MemorySink::new());
        let worker = JobWorker::spawn(orchestrator(sink.clone()));

        // Empty job → fast deterministic failure, no capability involved.
        worker.submit(JobRequest::new(vec![])).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if sink.last_terminal().is_some() {
                break;
            }
            assert!(Instant::now() < deadline, "worker never reported terminal");
            std::thread::sleep(Duration::from_millis(10));
        }

        match sink.last_terminal() {
            Some(JobOutcome::Failed(message)) => assert!(message.contains("no files")),
            other => panic!("unexpected terminal: {other:?}"),
        }
    }

    #[test]
    fn shutdown_is_graceful_and_idempotent() {
        let sink = Arc::new(MemorySink::new());
        let mut worker = JobWorker::spawn(orchestrator(sink));
        worker.shutdown();
        worker.shutdown();
        assert!(worker.submit(JobRequest::new(vec![])).is_err());
    }

    #[test]
    fn drop_joins_the_thread() {
        let sink = Arc::new(MemorySink::new());
        let worker = JobWorker::spawn(orchestrator(sink));
        drop(worker);
    }
}
