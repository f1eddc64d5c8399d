use serde::{Deserialize, Serialize};

use crate::models::PartialExtraction;
use crate::pipeline::structured::PageTypeHint;

/// Result of extracting one page. Ephemeral — consumed immediately by the
/// merger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtractionResult {
    pub page_index: usize,
    pub success: bool,
    pub data: Option<PartialExtraction>,
    pub page_type: PageTypeHint,
    pub error: Option<String>,
}

impl PageExtractionResult {
    pub fn failed(page_index: usize, error: &str) -> Self {
        Self {
            page_index,
            success: false,
            data: None,
            page_type: PageTypeHint::Other,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of chunked parsing for one document.
#[derive(Debug, Clone, Default)]
pub struct ChunkedOutcome {
    pub page_results: Vec<PageExtractionResult>,
    /// True when at least one page extracted and no page failure was fatal
    /// to the document (see `skip_failed_pages`).
    pub success: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ChunkedOutcome {
    pub fn successful_pages(&self) -> usize {
        self.page_results.iter().filter(|p| p.success).count()
    }

    pub fn failed_pages(&self) -> usize {
        self.page_results.iter().filter(|p| !p.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_constructor_shape() {
        let page = PageExtractionResult::failed(4, "timed out");
        assert_eq!(page.page_index, 4);
        assert!(!page.success);
        assert!(page.data.is_none());
        assert_eq!(page.page_type, PageTypeHint::Other);
        assert_eq!(page.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn outcome_counts() {
        let outcome = ChunkedOutcome {
            page_results: vec![
                PageExtractionResult {
                    page_index: 0,
                    success: true,
                    data: Some(PartialExtraction::default()),
                    page_type: PageTypeHint::Summary,
                    error: None,
                },
                PageExtractionResult::failed(1, "boom"),
            ],
            success: true,
            warnings: vec![],
            errors: vec![],
        };
        assert_eq!(outcome.successful_pages(), 1);
        assert_eq!(outcome.failed_pages(), 1);
    }
}
