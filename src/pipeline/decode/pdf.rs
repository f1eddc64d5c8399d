//! PDF page access behind a seam.
//!
//! The chunked parser needs page counting and single-page extraction; the
//! statement path needs direct text when the PDF carries a text layer.
//! `lopdf` keeps this pure Rust — rendering scanned pages is the extraction
//! capability's job, not ours.

use lopdf::Document;

use super::DecodeError;

/// Page-level access to a PDF. Trait seam so the chunked parser can be
/// tested without real PDF bytes.
pub trait PageSplitter: Send + Sync {
    fn page_count(&self, bytes: &[u8]) -> Result<usize, DecodeError>;

    /// Extract one page (0-based) as a standalone single-page PDF.
    fn split_page(&self, bytes: &[u8], page_index: usize) -> Result<Vec<u8>, DecodeError>;

    /// Direct text extraction across all pages (empty for scanned PDFs).
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DecodeError>;
}

/// lopdf-backed splitter.
pub struct LopdfSplitter;

impl LopdfSplitter {
    fn load(bytes: &[u8]) -> Result<Document, DecodeError> {
        Document::load_mem(bytes).map_err(|e| DecodeError::Pdf(e.to_string()))
    }
}

impl PageSplitter for LopdfSplitter {
    fn page_count(&self, bytes: &[u8]) -> Result<usize, DecodeError> {
        let doc = Self::load(bytes)?;
        let count = doc.get_pages().len();
        if count == 0 {
            return Err(DecodeError::EmptyDocument);
        }
        Ok(count)
    }

    fn split_page(&self, bytes: &[u8], page_index: usize) -> Result<Vec<u8>, DecodeError> {
        let mut doc = Self::load(bytes)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let count = page_numbers.len();
        if page_index >= count {
            return Err(DecodeError::PageOutOfRange {
                index: page_index,
                count,
            });
        }

        // Keep only the requested page; delete_pages takes 1-based numbers.
        let keep = page_numbers[page_index];
        let delete: Vec<u32> = page_numbers.into_iter().filter(|&n| n != keep).collect();
        doc.delete_pages(&delete);
        doc.prune_objects();

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| DecodeError::Pdf(e.to_string()))?;
        Ok(buf)
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let doc = Self::load(bytes)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(DecodeError::EmptyDocument);
        }
        doc.extract_text(&page_numbers)
            .map_err(|e| DecodeError::Pdf(e.to_string()))
    }
}
