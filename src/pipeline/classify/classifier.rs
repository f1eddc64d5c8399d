use crate::capability::{ExtractionCapability, PromptPart};
use crate::models::{Classification, DocumentKind, FileFamily, UploadedFile};
use crate::pipeline::decode::{decode_spreadsheet, decode_text};
use crate::pipeline::structured::extract_first_json_object;
use crate::storage::FileStore;

/// Maximum characters of decoded content shown to the capability.
/// Classification needs cues, not the whole document.
const CONTENT_EXCERPT_CHARS: usize = 6_000;

/// Maximum spreadsheet rows rendered for classification.
const GRID_EXCERPT_ROWS: usize = 60;

/// Fixed instruction describing the six document types and the observable
/// cues that distinguish them.
const CLASSIFY_INSTRUCTION: &str = r#"You are a merchant-services document classifier. Decide which ONE of these types the document is:
- processing_statement: a monthly statement from a card processor. Cues: a processor name, a statement period, per-brand sections (VISA/MASTERCARD/...), actual transaction fee lines, "Total Processing Fees".
- pricing_spreadsheet_interchange: a pricing comparison built around interchange-plus pricing. Cues: columns labeled current vs proposed, markup/basis-point rows, "interchange plus" wording, savings rows.
- pricing_spreadsheet_dual_pricing: a pricing comparison built around dual pricing / cash discounting. Cues: cash price vs card price columns, "dual pricing" or "cash discount" wording.
- pricing_spreadsheet_mixed: a pricing comparison presenting both interchange-plus and dual-pricing options.
- proposal_document: a pre-built merchant proposal. Cues: marketing layout, "prepared for", proposed rates and projected savings without raw statement detail.
- unknown: none of the above.

Return ONLY a JSON object, no markdown:
{"document_type": "<one of the six labels>", "confidence": <0-100>, "summary": "<one sentence on what the document is>"}"#;

/// Capability-backed classifier. Never errors; see module docs.
pub struct DocumentClassifier<'a> {
    capability: &'a dyn ExtractionCapability,
    model_name: String,
}

impl<'a> DocumentClassifier<'a> {
    pub fn new(capability: &'a dyn ExtractionCapability, model_name: &str) -> Self {
        Self {
            capability,
            model_name: model_name.to_string(),
        }
    }

    pub fn classify(&self, file: &UploadedFile, store: &dyn FileStore) -> Classification {
        let _span =
            tracing::info_span!("classify", file = %file.display_name).entered();

        let bytes = match store.download(&file.path) {
            Ok(b) => b,
            Err(e) => return Classification::unknown(file, &format!("download failed: {e}")),
        };
        if bytes.is_empty() {
            return Classification::unknown(file, "file is empty");
        }

        let parts = match build_parts(file, &bytes) {
            Ok(parts) => parts,
            Err(reason) => return Classification::unknown(file, &reason),
        };

        let response = match self.capability.generate(&self.model_name, &parts) {
            Ok(r) => r,
            Err(e) => {
                return Classification::unknown(file, &format!("classification failed: {e}"))
            }
        };

        match parse_classification_response(&response) {
            Some((kind, confidence, summary)) => {
                tracing::info!(
                    file = %file.display_name,
                    kind = kind.as_str(),
                    confidence,
                    "document classified"
                );
                Classification {
                    file: file.clone(),
                    kind,
                    confidence,
                    summary,
                }
            }
            None => Classification::unknown(file, "classifier returned an unreadable response"),
        }
    }
}

fn build_parts(file: &UploadedFile, bytes: &[u8]) -> Result<Vec<PromptPart>, String> {
    match file.family() {
        FileFamily::Spreadsheet => {
            let grid = decode_spreadsheet(bytes).map_err(|e| e.to_string())?;
            if grid.is_empty() {
                return Err("spreadsheet has no cells".to_string());
            }
            Ok(vec![PromptPart::text(format!(
                "{CLASSIFY_INSTRUCTION}\n\nDOCUMENT (spreadsheet cells):\n{}",
                grid.to_grid_text(GRID_EXCERPT_ROWS)
            ))])
        }
        FileFamily::Pdf => Ok(vec![
            PromptPart::text(CLASSIFY_INSTRUCTION),
            PromptPart::pdf(bytes.to_vec()),
        ]),
        FileFamily::Image => Ok(vec![
            PromptPart::text(CLASSIFY_INSTRUCTION),
            PromptPart::Image {
                media_type: file.mime_type.clone(),
                bytes: bytes.to_vec(),
            },
        ]),
        FileFamily::PlainText => {
            let text = decode_text(bytes);
            let excerpt: String = text.chars().take(CONTENT_EXCERPT_CHARS).collect();
            Ok(vec![PromptPart::text(format!(
                "{CLASSIFY_INSTRUCTION}\n\nDOCUMENT:\n{excerpt}"
            ))])
        }
        FileFamily::Unknown => Err(format!(
            "unsupported file type ({})",
            if file.mime_type.is_empty() {
                "no mime type"
            } else {
                file.mime_type.as_str()
            }
        )),
    }
}

fn parse_classification_response(response: &str) -> Option<(DocumentKind, u8, String)> {
    let json_str = extract_first_json_object(response)?;
    let value: serde_json::Value = serde_json::from_str(json_str).ok()?;
    let obj = value.as_object()?;

    let kind = obj
        .get("document_type")
        .and_then(|v| v.as_str())
        .map(map_document_kind)
        .unwrap_or(DocumentKind::Unknown);

    let confidence = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(|c| if c > 0.0 && c <= 1.0 { c * 100.0 } else { c })
        .unwrap_or(50.0)
        .clamp(0.0, 100.0)
        .round() as u8;

    let summary = obj
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some((kind, confidence, summary))
}

/// Map the model's type string onto the closed enum, tolerating the label
/// variants models actually produce.
pub fn map_document_kind(type_str: &str) -> DocumentKind {
    if let Some(kind) = DocumentKind::from_str(type_str.trim()) {
        return kind;
    }
    match type_str.to_lowercase().trim() {
        "statement" | "merchant statement" | "processing statement" => {
            DocumentKind::ProcessingStatement
        }
        "pricing spreadsheet" | "pricing_spreadsheet" | "spreadsheet" => {
            DocumentKind::PricingSpreadsheetMixed
        }
        "interchange plus spreadsheet" | "interchange_plus" => {
            DocumentKind::PricingSpreadsheetInterchange
        }
        "dual pricing spreadsheet" | "dual_pricing" | "cash discount" => {
            DocumentKind::PricingSpreadsheetDualPricing
        }
        "proposal" | "merchant proposal" => DocumentKind::ProposalDocument,
        _ => DocumentKind::Unknown,
    }
}
