//! Format-specific readers. No semantic knowledge: a raw file becomes plain
//! text, a CSV-like cell grid, or a page-addressable PDF.

pub mod text;
pub mod table;
pub mod pdf;

pub use text::*;
pub use table::*;
pub use pdf::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("PDF parsing failed: {0}")]
    Pdf(String),

    #[error("spreadsheet decoding failed: {0}")]
    Spreadsheet(String),

    #[error("text encoding error: {0}")]
    Encoding(String),

    #[error("document has no pages")]
    EmptyDocument,

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}
