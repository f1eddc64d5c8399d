//! The partial-record shape every extractor produces.
//!
//! `PartialExtraction` is the only thing the merge stage consumes: the
//! heuristic parser, the structured extractor and the chunked page payloads
//! all coerce into it. Untyped capability JSON never flows past the
//! structured-extractor boundary.

use serde::{Deserialize, Serialize};

use super::classification::DocumentKind;
use super::proposal::ProposedOption;
use super::record::{CardBreakdowns, FeeBreakdown};

/// A partial view of the current state extracted from one source.
/// Totals stay optional so "not observed" never collapses into zero before
/// the merge stage runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialExtraction {
    pub source_kind: Option<DocumentKind>,
    pub merchant_name: Option<String>,
    pub processor_name: Option<String>,
    pub statement_period: Option<String>,
    pub total_volume: Option<f64>,
    pub total_transactions: Option<f64>,
    pub total_monthly_cost: Option<f64>,
    pub card_breakdown: CardBreakdowns,
    pub fees: FeeBreakdown,
    pub options: Vec<ProposedOption>,
    /// 0–100. Heuristic extractions are deterministic and report 100 when
    /// they anchored at all; capability-backed extractions carry the model's
    /// self-reported score (default 50).
    pub confidence: u8,
    pub warnings: Vec<String>,
}

impl PartialExtraction {
    /// True when the source yielded no identity fields, no totals, no brand
    /// figures and no fee lines — i.e. the extractor found nothing to say.
    pub fn is_empty(&self) -> bool {
        self.merchant_name.is_none()
            && self.processor_name.is_none()
            && self.statement_period.is_none()
            && self.total_volume.is_none()
            && self.total_transactions.is_none()
            && self.total_monthly_cost.is_none()
            && self.card_breakdown == CardBreakdowns::default()
            && self.fees == FeeBreakdown::default()
            && self.options.is_empty()
    }
}

/// What became of one extraction path, as seen by the merger. The fallback
/// warning for a failed pricing path is part of the merge contract, so the
/// merger must distinguish "never attempted" from "attempted and failed".
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// No document of this kind was submitted.
    Absent,
    /// Extraction was attempted and failed; the reason is absorbed into the
    /// merged warnings.
    Failed(String),
    Extracted(PartialExtraction),
}

impl SourceOutcome {
    pub fn as_extracted(&self) -> Option<&PartialExtraction> {
        match self {
            Self::Extracted(partial) => Some(partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_partial_is_empty() {
        assert!(PartialExtraction::default().is_empty());
    }

    #[test]
    fn partial_with_volume_not_empty() {
        let partial = PartialExtraction {
            total_volume: Some(40_000.0),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn partial_with_observed_zero_not_empty() {
        // Observed zero is information; only a fully unobserved partial
        // counts as empty.
        let partial = PartialExtraction {
            total_monthly_cost: Some(0.0),
            ..Default::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn source_outcome_accessor() {
        let outcome = SourceOutcome::Extracted(PartialExtraction::default());
        assert!(outcome.as_extracted().is_some());
        assert!(SourceOutcome::Absent.as_extracted().is_none());
        assert!(SourceOutcome::Failed("boom".into()).as_extracted().is_none());
    }
}
