//! Multi-source merge.
//!
//! Pure and deterministic: no capability calls, no I/O. Combines the
//! pricing-spreadsheet extraction, the statement extraction and chunked
//! page results into one canonical record under explicit precedence rules.

pub mod merger;

pub use merger::*;
