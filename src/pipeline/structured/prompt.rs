//! Extraction prompts. Each prompt enumerates the exact output field set,
//! demands bare JSON, and lists the label synonyms that appear on real
//! statements so the model maps them instead of inventing fields.

/// Shared schema block: the exact field set and types.
const SCHEMA_BLOCK: &str = r#"Return ONLY a JSON object, no markdown, no commentary, with exactly these fields (use null when a value is not present in the document — never guess):
{
  "merchant_name": string or null,
  "processor_name": string or null,
  "statement_period": string or null,
  "total_volume": number or null,
  "total_transactions": number or null,
  "total_monthly_cost": number or null,
  "card_breakdown": {
    "visa": {"volume": number|null, "transaction_count": number|null, "rate_percent": number|null, "per_transaction_fee": number|null, "total_cost": number|null},
    "mastercard": {...same fields...},
    "discover": {...},
    "amex": {...},
    "debit": {...}
  },
  "fees": {
    "interchange": number|null,
    "assessments": number|null,
    "processor_markup": number|null,
    "monthly_fee": number|null,
    "pci_fee": number|null,
    "batch_fee": number|null,
    "other": number|null
  },
  "proposed_options": [
    {"pricing_model": "interchange_plus" or "dual_pricing",
     "markup_percent": number|null, "per_transaction_fee": number|null,
     "monthly_fee": number|null, "card_price_uplift_percent": number|null,
     "proposed_monthly_cost": number|null}
  ],
  "confidence": number between 0 and 100,
  "notes": string or null
}"#;

const HEURISTICS_BLOCK: &str = r#"Extraction heuristics:
- "Amount Submitted", "Total Sales", "Gross Volume" all mean total_volume.
- "Total Processing Fees", "Total Fees Charged", "Total Charges" mean total_monthly_cost.
- "Dues & Assessments" means fees.assessments; "Service Charges" usually means fees.processor_markup.
- "Statement Fee", "Monthly Service Fee", "Account Fee" mean fees.monthly_fee.
- Brand sections may abbreviate: MC = mastercard, AMEX = amex.
- A pricing comparison sheet lists current figures in one column and proposed figures in another; current figures fill the top-level fields, proposed figures fill proposed_options.
- Dollar amounts may include $ and thousands separators; percentages include %. Emit plain numbers.
- It is correct and expected to return null for anything the document does not state."#;

/// Prompt for whole-document extraction (statement PDFs, images, proposals).
pub fn build_document_prompt() -> String {
    format!(
        "You are a merchant-services pricing analyst. Extract the merchant's \
current card-processing costs and any proposed pricing options from the \
attached document.\n\n{SCHEMA_BLOCK}\n\n{HEURISTICS_BLOCK}"
    )
}

/// Prompt for spreadsheet cell grids. The grid text is embedded directly.
pub fn build_spreadsheet_prompt(grid_text: &str) -> String {
    format!(
        "You are a merchant-services pricing analyst. The following is a \
pricing spreadsheet rendered as rows of pipe-separated cells. Extract the \
merchant's current processing costs and every proposed pricing option it \
compares.\n\nSPREADSHEET:\n{grid_text}\n\n{SCHEMA_BLOCK}\n\n{HEURISTICS_BLOCK}"
    )
}

/// Prompt for one page of a chunked document. Adds the page_type hint the
/// merger relies on to avoid double counting repeated grand totals.
pub fn build_page_prompt(page_index: usize) -> String {
    format!(
        "You are a merchant-services pricing analyst. The attachment is page \
{page} of a multi-page merchant processing statement. Extract only figures \
actually printed on this page.\n\n{SCHEMA_BLOCK}\n\nAdditionally include a \
\"page_type\" field: \"summary\" if this page shows grand totals for the \
whole statement, \"detail\" if it shows per-brand or per-day breakdowns, \
\"fee_breakdown\" if it itemizes fee lines, \"other\" otherwise.\n\n\
{HEURISTICS_BLOCK}",
        page = page_index + 1
    )
}
