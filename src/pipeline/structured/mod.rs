//! Schema-constrained extraction through the reasoning capability.
//!
//! The capability returns free text that should contain JSON. The first
//! balanced object is located by string-aware bracket matching, numbers are
//! coerced whether they arrive as numbers or `"$1,234"` strings, and a
//! response that cannot be parsed degrades to a zero-confidence record with
//! a note instead of an error.

pub mod json;
pub mod prompt;
pub mod types;
pub mod extractor;

pub use json::*;
pub use prompt::*;
pub use types::*;
pub use extractor::*;
