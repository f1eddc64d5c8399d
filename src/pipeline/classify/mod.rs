//! Content-based document classification.
//!
//! Classification is a routing hint, not a gate: this module never errors
//! for a readable input. Any internal failure — unsupported type, decode
//! error, capability failure — becomes `Unknown` with confidence 0 and the
//! reason in the summary.

pub mod classifier;

pub use classifier::*;
