use crate::capability::{CapabilityError, ExtractionCapability, PromptPart};
use crate::models::DocumentKind;

use super::types::{parse_structured_response, StructuredExtraction};

/// Capability-backed structured extractor. The capability is injected at
/// construction; there is no hidden global client.
pub struct StructuredExtractor<'a> {
    capability: &'a dyn ExtractionCapability,
    model_name: String,
}

impl<'a> StructuredExtractor<'a> {
    pub fn new(capability: &'a dyn ExtractionCapability, model_name: &str) -> Self {
        Self {
            capability,
            model_name: model_name.to_string(),
        }
    }

    /// Run one extraction call and coerce the response.
    ///
    /// Capability errors propagate (the orchestrator distinguishes fatal
    /// configuration errors from transient per-file ones); malformed output
    /// never does — it degrades to a zero-confidence record with a note.
    pub fn extract(
        &self,
        parts: &[PromptPart],
        source_kind: DocumentKind,
    ) -> Result<StructuredExtraction, CapabilityError> {
        let _span = tracing::info_span!(
            "structured_extract",
            kind = source_kind.as_str(),
            parts = parts.len(),
        )
        .entered();

        let response = self.capability.generate(&self.model_name, parts)?;

        let extraction = parse_structured_response(&response, source_kind);
        tracing::debug!(
            confidence = extraction.partial.confidence,
            warnings = extraction.partial.warnings.len(),
            options = extraction.partial.options.len(),
            "structured extraction parsed"
        );
        Ok(extraction)
    }
}
