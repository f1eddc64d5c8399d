use serde::{Deserialize, Serialize};

use super::classification::DocumentKind;
use super::proposal::ProposedOption;
use super::record::CurrentStateRecord;

/// Overall extraction quality, derived from validator warning counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    Partial,
    NeedsReview,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::NeedsReview => "needs_review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "partial" => Some(Self::Partial),
            "needs_review" => Some(Self::NeedsReview),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The canonical output of one job: current state plus proposed options,
/// with every upstream warning preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedResult {
    pub current: CurrentStateRecord,
    pub options: Vec<ProposedOption>,
    /// Union of the classifications that contributed data.
    pub document_kinds_seen: Vec<DocumentKind>,
    pub warnings: Vec<String>,
    pub status: ExtractionStatus,
    /// 0–100.
    pub confidence: u8,
}
