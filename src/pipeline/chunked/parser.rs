//! Sequential per-page driver with timeout, retry, skip-on-failure and
//! progress reporting.
//!
//! State machine per document:
//! split → [per page: extract → (success | retry ≤ N | skip on exhaustion)]*
//! → aggregate. An outer wall-clock deadline aborts remaining pages and
//! returns partial results rather than hanging.

use std::time::Instant;

use crate::capability::{CapabilityError, ExtractionCapability, PromptPart};
use crate::config::PipelineConfig;
use crate::models::DocumentKind;
use crate::pipeline::decode::PageSplitter;
use crate::pipeline::structured::{build_page_prompt, parse_structured_response, PageTypeHint};

use super::retry::{AttemptError, RetryPolicy};
use super::types::{ChunkedOutcome, PageExtractionResult};

/// Progress callback: monotonically non-decreasing percent plus a current
/// step description. Must be cheap and side-effect-free beyond reporting.
pub type ProgressFn<'a> = &'a dyn Fn(u8, &str);

pub struct ChunkedParser<'a> {
    capability: &'a dyn ExtractionCapability,
    splitter: &'a dyn PageSplitter,
    config: &'a PipelineConfig,
}

impl<'a> ChunkedParser<'a> {
    pub fn new(
        capability: &'a dyn ExtractionCapability,
        splitter: &'a dyn PageSplitter,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            capability,
            splitter,
            config,
        }
    }

    /// Parse a large document page by page.
    ///
    /// Only fatal configuration errors propagate; everything else is
    /// absorbed into the outcome's page results, warnings and errors.
    pub fn parse(
        &self,
        bytes: &[u8],
        on_progress: Option<ProgressFn>,
    ) -> Result<ChunkedOutcome, CapabilityError> {
        let started = Instant::now();
        let mut outcome = ChunkedOutcome::default();

        let page_count = match self.splitter.page_count(bytes) {
            Ok(count) => count,
            Err(e) => {
                outcome.errors.push(format!("could not split document: {e}"));
                return Ok(outcome);
            }
        };

        let _span = tracing::info_span!("chunked_parse", pages = page_count).entered();
        tracing::info!(pages = page_count, "starting chunked extraction");

        let policy = RetryPolicy::from_config(self.config);

        for page_index in 0..page_count {
            if started.elapsed() >= self.config.job_timeout {
                let message = format!(
                    "overall timeout after {} of {page_count} pages; returning partial results",
                    outcome.page_results.len()
                );
                tracing::warn!(%message, "chunked extraction aborted");
                outcome.warnings.push(message);
                break;
            }

            let page = self.extract_page(bytes, page_index, &policy)?;
            let succeeded = page.success;
            if let Some(error) = &page.error {
                outcome
                    .errors
                    .push(format!("page {}: {error}", page_index + 1));
            }
            outcome.page_results.push(page);

            report(
                on_progress,
                (((page_index + 1) * 100) / page_count) as u8,
                &format!(
                    "page {}/{page_count} {}",
                    page_index + 1,
                    if succeeded { "extracted" } else { "failed" }
                ),
            );

            if !succeeded && !self.config.skip_failed_pages {
                outcome
                    .warnings
                    .push(format!("stopping at failed page {}", page_index + 1));
                break;
            }
        }

        let failed = outcome.failed_pages();
        if failed > 0 && self.config.skip_failed_pages {
            outcome
                .warnings
                .push(format!("{failed} of {page_count} pages failed extraction and were skipped"));
        }

        outcome.success = outcome.successful_pages() > 0
            && (self.config.skip_failed_pages || failed == 0);

        tracing::info!(
            pages = outcome.page_results.len(),
            ok = outcome.successful_pages(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chunked extraction finished"
        );

        Ok(outcome)
    }

    fn extract_page(
        &self,
        bytes: &[u8],
        page_index: usize,
        policy: &RetryPolicy,
    ) -> Result<PageExtractionResult, CapabilityError> {
        let page_bytes = match self.splitter.split_page(bytes, page_index) {
            Ok(b) => b,
            Err(e) => return Ok(PageExtractionResult::failed(page_index, &e.to_string())),
        };

        let prompt = build_page_prompt(page_index);

        let attempt_result = policy.run(|attempt| {
            let attempt_started = Instant::now();
            let parts = [PromptPart::text(prompt.clone()), PromptPart::pdf(page_bytes.clone())];

            let response = match self.capability.generate(&self.config.model_name, &parts) {
                Ok(r) => r,
                Err(e) if e.is_fatal() => return Err(AttemptError::Fatal(e)),
                Err(e) => return Err(AttemptError::Transient(e.to_string())),
            };

            // Covers capability implementations without their own request
            // timeout: a reply that blew the per-page budget counts as one.
            if attempt_started.elapsed() > policy.attempt_timeout {
                return Err(AttemptError::Transient(format!(
                    "page extraction exceeded {}s budget",
                    policy.attempt_timeout.as_secs()
                )));
            }

            let extraction =
                parse_structured_response(&response, DocumentKind::ProcessingStatement);
            if extraction.partial.confidence == 0 && extraction.partial.is_empty() {
                // Malformed payload — a fresh generation usually repairs it.
                return Err(AttemptError::Transient(format!(
                    "attempt {attempt}: unparseable page payload"
                )));
            }
            Ok(extraction)
        });

        match attempt_result {
            Ok(extraction) => Ok(PageExtractionResult {
                page_index,
                success: true,
                page_type: extraction.page_type.unwrap_or(PageTypeHint::Other),
                data: Some(extraction.partial),
                error: None,
            }),
            Err(AttemptError::Fatal(e)) => Err(e),
            Err(AttemptError::Transient(reason)) => {
                Ok(PageExtractionResult::failed(page_index, &reason))
            }
        }
    }
}

fn report(on_progress: Option<ProgressFn>, percent: u8, message: &str) {
    if let Some(progress) = on_progress {
        progress(percent.min(100), message);
    }
}
