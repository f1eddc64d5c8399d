use serde::{Deserialize, Serialize};

use super::file::UploadedFile;

/// The closed set of document types the pipeline knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ProcessingStatement,
    PricingSpreadsheetInterchange,
    PricingSpreadsheetDualPricing,
    PricingSpreadsheetMixed,
    ProposalDocument,
    Unknown,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessingStatement => "processing_statement",
            Self::PricingSpreadsheetInterchange => "pricing_spreadsheet_interchange",
            Self::PricingSpreadsheetDualPricing => "pricing_spreadsheet_dual_pricing",
            Self::PricingSpreadsheetMixed => "pricing_spreadsheet_mixed",
            Self::ProposalDocument => "proposal_document",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing_statement" => Some(Self::ProcessingStatement),
            "pricing_spreadsheet_interchange" => Some(Self::PricingSpreadsheetInterchange),
            "pricing_spreadsheet_dual_pricing" => Some(Self::PricingSpreadsheetDualPricing),
            "pricing_spreadsheet_mixed" => Some(Self::PricingSpreadsheetMixed),
            "proposal_document" => Some(Self::ProposalDocument),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn all() -> &'static [DocumentKind] {
        &[
            Self::ProcessingStatement,
            Self::PricingSpreadsheetInterchange,
            Self::PricingSpreadsheetDualPricing,
            Self::PricingSpreadsheetMixed,
            Self::ProposalDocument,
            Self::Unknown,
        ]
    }

    /// True for any of the three pricing-spreadsheet variants.
    pub fn is_pricing_spreadsheet(&self) -> bool {
        matches!(
            self,
            Self::PricingSpreadsheetInterchange
                | Self::PricingSpreadsheetDualPricing
                | Self::PricingSpreadsheetMixed
        )
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing hint produced once per file, consumed by the orchestrator.
/// Never a gate: low confidence is a soft warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub file: UploadedFile,
    pub kind: DocumentKind,
    /// 0–100.
    pub confidence: u8,
    /// Human-readable summary, or the failure reason when `kind` is Unknown.
    pub summary: String,
}

impl Classification {
    /// Failure-shaped classification: unknown kind, zero confidence,
    /// reason in the summary. The classifier contract forbids erroring.
    pub fn unknown(file: &UploadedFile, reason: &str) -> Self {
        Self {
            file: file.clone(),
            kind: DocumentKind::Unknown,
            confidence: 0,
            summary: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_kind_roundtrip() {
        for kind in DocumentKind::all() {
            let s = kind.as_str();
            assert_eq!(DocumentKind::from_str(s), Some(*kind), "roundtrip failed for {s}");
        }
    }

    #[test]
    fn document_kind_from_invalid() {
        assert_eq!(DocumentKind::from_str("invoice"), None);
        assert_eq!(DocumentKind::from_str(""), None);
    }

    #[test]
    fn spreadsheet_variants_detected() {
        assert!(DocumentKind::PricingSpreadsheetInterchange.is_pricing_spreadsheet());
        assert!(DocumentKind::PricingSpreadsheetDualPricing.is_pricing_spreadsheet());
        assert!(DocumentKind::PricingSpreadsheetMixed.is_pricing_spreadsheet());
        assert!(!DocumentKind::ProcessingStatement.is_pricing_spreadsheet());
        assert!(!DocumentKind::Unknown.is_pricing_spreadsheet());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&DocumentKind::ProcessingStatement).unwrap();
        assert_eq!(json, "\"processing_statement\"");
    }

    #[test]
    fn unknown_classification_is_zero_confidence() {
        let file = UploadedFile::new("u/x.bin", "", "x.bin");
        let c = Classification::unknown(&file, "unsupported format");
        assert_eq!(c.kind, DocumentKind::Unknown);
        assert_eq!(c.confidence, 0);
        assert!(c.summary.contains("unsupported"));
    }
}
