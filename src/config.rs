//! Pipeline configuration.
//!
//! One struct with documented defaults drives every threshold, timeout and
//! retry bound in the pipeline. All values can be overridden per deployment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which source wins when a pricing-spreadsheet extraction and a statement
/// extraction both report conflicting non-zero current-state totals.
/// The losing value is always logged as a warning, never dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePrecedence {
    PreferSpreadsheet,
    PreferStatement,
}

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model identifier passed to the extraction capability.
    pub model_name: String,
    /// Files larger than this go through the chunked per-page parser.
    pub chunk_threshold_bytes: u64,
    /// Budget for a single page extraction attempt.
    pub page_timeout: Duration,
    /// Wall-clock ceiling for one whole job; exceeding it returns whatever
    /// pages completed as a partial result.
    pub job_timeout: Duration,
    /// Attempts per page before giving up (first try included).
    pub max_page_attempts: u32,
    /// Pause between page retry attempts. Bounded — no backoff loop.
    pub retry_backoff: Duration,
    /// When true, a page that exhausts its retries is recorded as failed and
    /// processing continues; a single bad page never fails the document.
    pub skip_failed_pages: bool,
    /// Classifications below this confidence get a soft routing warning.
    pub min_classification_confidence: u8,
    /// Conflict resolution between spreadsheet and statement totals.
    pub precedence: SourcePrecedence,
    /// Industry-default statement/monthly fee applied by the heuristic
    /// parser when the statement carries no such line. Always accompanied by
    /// a "default applied" warning so it can never pass as extracted data.
    pub default_statement_fee: f64,
    /// Upper bound on proposed options carried into the merged record.
    pub max_proposed_options: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_name: "statement-extractor:latest".to_string(),
            chunk_threshold_bytes: 5 * 1024 * 1024,
            page_timeout: Duration::from_secs(45),
            job_timeout: Duration::from_secs(15 * 60),
            max_page_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            skip_failed_pages: true,
            min_classification_confidence: 70,
            precedence: SourcePrecedence::PreferSpreadsheet,
            default_statement_fee: 64.95,
            max_proposed_options: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_threshold_bytes, 5 * 1024 * 1024);
        assert_eq!(config.page_timeout, Duration::from_secs(45));
        assert_eq!(config.job_timeout, Duration::from_secs(900));
        assert_eq!(config.max_page_attempts, 3);
        assert!(config.skip_failed_pages);
        assert_eq!(config.min_classification_confidence, 70);
        assert_eq!(config.precedence, SourcePrecedence::PreferSpreadsheet);
        assert!((config.default_statement_fee - 64.95).abs() < 1e-9);
    }

    #[test]
    fn precedence_serde() {
        let json = serde_json::to_string(&SourcePrecedence::PreferStatement).unwrap();
        assert_eq!(json, "\"prefer_statement\"");
    }
}
