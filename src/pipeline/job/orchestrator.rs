//! Sequences classification, routing, extraction, merge and validation for
//! one submitted job.
//!
//! Error taxonomy: only configuration errors (capability unreachable or
//! unauthenticated) and an empty file list cross the job boundary as
//! failures. Per-file and per-page problems are absorbed into the merged
//! record's warnings — an agent always gets some usable extraction when any
//! part of the input was readable.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::capability::{CapabilityError, ExtractionCapability, PromptPart};
use crate::config::PipelineConfig;
use crate::models::{DocumentKind, FileFamily, SourceOutcome, UploadedFile};
use crate::pipeline::chunked::{ChunkedParser, PageExtractionResult};
use crate::pipeline::classify::DocumentClassifier;
use crate::pipeline::decode::{decode_spreadsheet, decode_text, PageSplitter};
use crate::pipeline::heuristic::parse_statement;
use crate::pipeline::merge::Merger;
use crate::pipeline::structured::{
    build_document_prompt, build_spreadsheet_prompt, StructuredExtractor,
};
use crate::pipeline::validate;
use crate::storage::FileStore;

use super::{CompletionSink, JobError, JobOutcome, ProgressSink};

/// Characters of plain text embedded into an extraction prompt.
const TEXT_PROMPT_LIMIT: usize = 40_000;

/// Spreadsheet rows rendered into an extraction prompt.
const GRID_PROMPT_ROWS: usize = 200;

/// Minimum direct-text length before a PDF is considered to have a usable
/// text layer; below this the whole document goes to the capability.
const MIN_PDF_TEXT_CHARS: usize = 40;

/// One submitted job: an ordered list of uploaded files.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub id: Uuid,
    pub files: Vec<UploadedFile>,
    pub submitted_at: DateTime<Utc>,
}

impl JobRequest {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self {
            id: Uuid::new_v4(),
            files,
            submitted_at: Utc::now(),
        }
    }
}

pub struct JobOrchestrator {
    capability: Arc<dyn ExtractionCapability>,
    store: Arc<dyn FileStore>,
    splitter: Arc<dyn PageSplitter>,
    progress: Arc<dyn ProgressSink>,
    completion: Arc<dyn CompletionSink>,
    config: PipelineConfig,
}

impl JobOrchestrator {
    pub fn new(
        capability: Arc<dyn ExtractionCapability>,
        store: Arc<dyn FileStore>,
        splitter: Arc<dyn PageSplitter>,
        progress: Arc<dyn ProgressSink>,
        completion: Arc<dyn CompletionSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            capability,
            store,
            splitter,
            progress,
            completion,
            config,
        }
    }

    /// Run one job to its terminal state. Always reports the terminal state
    /// through the completion sink before returning.
    pub fn run(&self, request: &JobRequest) -> JobOutcome {
        let _span = tracing::info_span!("job", job_id = %request.id, files = request.files.len())
            .entered();
        let tracker = ProgressTracker::new(&*self.progress, request.id);

        let outcome = match self.execute(request, &tracker) {
            Ok(result) => JobOutcome::Completed(result),
            Err(e) => JobOutcome::Failed(e.to_string()),
        };

        self.completion.report_terminal(request.id, &outcome);
        outcome
    }

    fn execute(
        &self,
        request: &JobRequest,
        tracker: &ProgressTracker,
    ) -> Result<crate::models::MergedResult, JobError> {
        if request.files.is_empty() {
            return Err(JobError::NoFiles);
        }
        let file_count = request.files.len();

        // Stage 1: classify every file.
        tracker.report(5, &format!("classifying {file_count} file(s)"));
        let classifier = DocumentClassifier::new(&*self.capability, &self.config.model_name);
        let mut classifications = Vec::with_capacity(file_count);
        for (i, file) in request.files.iter().enumerate() {
            let classification = classifier.classify(file, &*self.store);
            tracker.report(
                (5 + ((i + 1) * 20) / file_count) as u8,
                &format!(
                    "classified {} as {}",
                    file.display_name, classification.kind
                ),
            );
            classifications.push(classification);
        }

        let mut job_warnings: Vec<String> = Vec::new();
        for classification in &classifications {
            if classification.kind != DocumentKind::Unknown
                && classification.confidence < self.config.min_classification_confidence
            {
                job_warnings.push(format!(
                    "low classification confidence ({}) for {}: {}",
                    classification.confidence,
                    classification.file.display_name,
                    classification.summary
                ));
            }
        }

        // Stage 2: route each file to its extractor.
        let mut pricing = SourceOutcome::Absent;
        let mut statement = SourceOutcome::Absent;
        let mut pages: Vec<PageExtractionResult> = Vec::new();

        for (i, classification) in classifications.iter().enumerate() {
            let file = &classification.file;
            let kind = classification.kind;

            if kind.is_pricing_spreadsheet() || kind == DocumentKind::ProposalDocument {
                if matches!(pricing, SourceOutcome::Absent) {
                    pricing = self.extract_structured_file(file, kind)?;
                } else {
                    job_warnings
                        .push(format!("additional pricing document {} ignored", file.display_name));
                }
            } else if kind == DocumentKind::ProcessingStatement {
                if matches!(statement, SourceOutcome::Absent) && pages.is_empty() {
                    let (outcome, page_results) =
                        self.extract_statement(file, tracker, &mut job_warnings)?;
                    statement = outcome;
                    pages = page_results;
                } else {
                    job_warnings
                        .push(format!("additional statement {} ignored", file.display_name));
                }
            } else {
                // Unknown: not a gate. Attempt a generic extraction when the
                // statement slot is free so the agent still gets something.
                if matches!(statement, SourceOutcome::Absent) && pages.is_empty() {
                    job_warnings.push(format!(
                        "could not classify {} ({}); attempted generic extraction",
                        file.display_name, classification.summary
                    ));
                    statement = self.extract_structured_file(file, DocumentKind::Unknown)?;
                } else {
                    job_warnings.push(format!("unclassified file {} skipped", file.display_name));
                }
            }

            tracker.report(
                (30 + ((i + 1) * 55) / file_count) as u8,
                &format!("processed {}", file.display_name),
            );
        }

        // Stage 3 + 4: merge, then validate.
        tracker.report(90, "merging extraction results");
        let merger = Merger::new(&self.config);
        let mut merged = merger.merge(&pricing, &statement, &pages);
        merged.warnings.extend(job_warnings);

        tracker.report(95, "validating merged record");
        validate::apply(&mut merged);

        tracker.report(100, "complete");
        Ok(merged)
    }

    /// Whole-document structured extraction (spreadsheets, proposals,
    /// images, PDFs without a usable text layer, unclassified files).
    fn extract_structured_file(
        &self,
        file: &UploadedFile,
        kind: DocumentKind,
    ) -> Result<SourceOutcome, JobError> {
        let bytes = match self.store.download(&file.path) {
            Ok(b) => b,
            Err(e) => return Ok(SourceOutcome::Failed(e.to_string())),
        };

        let parts = match build_extraction_parts(file, &bytes) {
            Ok(parts) => parts,
            Err(reason) => return Ok(SourceOutcome::Failed(reason)),
        };

        self.run_structured(&parts, kind)
    }

    fn run_structured(
        &self,
        parts: &[PromptPart],
        kind: DocumentKind,
    ) -> Result<SourceOutcome, JobError> {
        let extractor = StructuredExtractor::new(&*self.capability, &self.config.model_name);
        match extractor.extract(parts, kind) {
            Ok(extraction) => Ok(SourceOutcome::Extracted(extraction.partial)),
            Err(e) => absorb_capability(e).map(SourceOutcome::Failed),
        }
    }

    /// Statement routing: chunked when the file exceeds the size threshold,
    /// heuristic over direct text when a text layer exists, structured
    /// extraction otherwise.
    fn extract_statement(
        &self,
        file: &UploadedFile,
        tracker: &ProgressTracker,
        job_warnings: &mut Vec<String>,
    ) -> Result<(SourceOutcome, Vec<PageExtractionResult>), JobError> {
        let size = match self.store.size(&file.path) {
            Ok(s) => s,
            Err(e) => return Ok((SourceOutcome::Failed(e.to_string()), vec![])),
        };
        let bytes = match self.store.download(&file.path) {
            Ok(b) => b,
            Err(e) => return Ok((SourceOutcome::Failed(e.to_string()), vec![])),
        };

        match file.family() {
            FileFamily::Pdf if size > self.config.chunk_threshold_bytes => {
                tracing::info!(
                    file = %file.display_name,
                    size,
                    threshold = self.config.chunk_threshold_bytes,
                    "large statement; using chunked extraction"
                );
                let parser = ChunkedParser::new(&*self.capability, &*self.splitter, &self.config);
                let on_progress = |percent: u8, message: &str| {
                    tracker.report((30 + (percent as usize) * 55 / 100) as u8, message);
                };
                let outcome = parser
                    .parse(&bytes, Some(&on_progress))
                    .map_err(|e| JobError::Configuration(e.to_string()))?;

                job_warnings.extend(outcome.warnings);
                job_warnings.extend(outcome.errors);

                if outcome.page_results.is_empty() {
                    return Ok((
                        SourceOutcome::Failed("chunked extraction produced no pages".to_string()),
                        vec![],
                    ));
                }
                Ok((SourceOutcome::Absent, outcome.page_results))
            }
            FileFamily::Pdf => {
                let text = self.splitter.extract_text(&bytes).unwrap_or_default();
                if text.trim().len() >= MIN_PDF_TEXT_CHARS {
                    self.statement_from_text(&text, file, &bytes, job_warnings)
                        .map(|outcome| (outcome, vec![]))
                } else {
                    // Scanned or image-only PDF: whole document to the
                    // capability.
                    let parts = [
                        PromptPart::text(build_document_prompt()),
                        PromptPart::pdf(bytes.clone()),
                    ];
                    self.run_structured(&parts, DocumentKind::ProcessingStatement)
                        .map(|outcome| (outcome, vec![]))
                }
            }
            FileFamily::PlainText => {
                let text = decode_text(&bytes);
                self.statement_from_text(&text, file, &bytes, job_warnings)
                    .map(|outcome| (outcome, vec![]))
            }
            FileFamily::Image => {
                let parts = [
                    PromptPart::text(build_document_prompt()),
                    PromptPart::Image {
                        media_type: file.mime_type.clone(),
                        bytes,
                    },
                ];
                self.run_structured(&parts, DocumentKind::ProcessingStatement)
                    .map(|outcome| (outcome, vec![]))
            }
            FileFamily::Spreadsheet | FileFamily::Unknown => self
                .extract_structured_file(file, DocumentKind::ProcessingStatement)
                .map(|outcome| (outcome, vec![])),
        }
    }

    /// Heuristic-first statement extraction over decoded text, with the
    /// structured extractor as fallback for out-of-family layouts.
    fn statement_from_text(
        &self,
        text: &str,
        file: &UploadedFile,
        bytes: &[u8],
        job_warnings: &mut Vec<String>,
    ) -> Result<SourceOutcome, JobError> {
        let result = parse_statement(text, self.config.default_statement_fee);

        if !result.partial.is_empty() {
            if let Some(savings) = result.savings_hint {
                job_warnings.push(format!(
                    "statement shows an estimated monthly savings line of ${savings:.2}"
                ));
            }
            return Ok(SourceOutcome::Extracted(result.partial));
        }

        tracing::debug!(
            file = %file.display_name,
            "heuristic parser found nothing; falling back to structured extraction"
        );
        let parts = if file.family() == FileFamily::Pdf {
            vec![
                PromptPart::text(build_document_prompt()),
                PromptPart::pdf(bytes.to_vec()),
            ]
        } else {
            let excerpt: String = text.chars().take(TEXT_PROMPT_LIMIT).collect();
            vec![PromptPart::text(format!(
                "{}\n\nDOCUMENT:\n{excerpt}",
                build_document_prompt()
            ))]
        };
        self.run_structured(&parts, DocumentKind::ProcessingStatement)
    }
}

/// Transient capability errors become per-file failure reasons; fatal ones
/// abort the job as configuration errors.
fn absorb_capability(e: CapabilityError) -> Result<String, JobError> {
    if e.is_fatal() {
        Err(JobError::Configuration(e.to_string()))
    } else {
        Ok(e.to_string())
    }
}

fn build_extraction_parts(file: &UploadedFile, bytes: &[u8]) -> Result<Vec<PromptPart>, String> {
    match file.family() {
        FileFamily::Spreadsheet => {
            let grid = decode_spreadsheet(bytes).map_err(|e| e.to_string())?;
            if grid.is_empty() {
                return Err("spreadsheet has no cells".to_string());
            }
            Ok(vec![PromptPart::text(build_spreadsheet_prompt(
                &grid.to_grid_text(GRID_PROMPT_ROWS),
            ))])
        }
        FileFamily::Pdf => Ok(vec![
            PromptPart::text(build_document_prompt()),
            PromptPart::pdf(bytes.to_vec()),
        ]),
        FileFamily::Image => Ok(vec![
            PromptPart::text(build_document_prompt()),
            PromptPart::Image {
                media_type: file.mime_type.clone(),
                bytes: bytes.to_vec(),
            },
        ]),
        FileFamily::PlainText => {
            let text = decode_text(bytes);
            let excerpt: String = text.chars().take(TEXT_PROMPT_LIMIT).collect();
            Ok(vec![PromptPart::text(format!(
                "{}\n\nDOCUMENT:\n{excerpt}",
                build_document_prompt()
            ))])
        }
        FileFamily::Unknown => Err(format!(
            "unsupported file type for {}",
            file.display_name
        )),
    }
}

/// Clamps job progress to a monotonically non-decreasing sequence even when
/// sub-stages (chunked pages, per-file steps) report overlapping ranges.
struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    job_id: Uuid,
    last: AtomicU8,
}

impl<'a> ProgressTracker<'a> {
    fn new(sink: &'a dyn ProgressSink, job_id: Uuid) -> Self {
        Self {
            sink,
            job_id,
            last: AtomicU8::new(0),
        }
    }

    fn report(&self, percent: u8, message: &str) {
        let clamped = percent.min(100).max(self.last.load(Ordering::Relaxed));
        self.last.store(clamped, Ordering::Relaxed);
        self.sink.report_progress(self.job_id, clamped, message);
    }
}
