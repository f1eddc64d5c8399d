//! Typed result of a structured extraction plus the lenient coercion from
//! untyped capability JSON. Nothing untyped flows past this file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::json::extract_first_json_object;
use crate::models::{
    CardBrand, DocumentKind, PartialExtraction, PricingModel, ProposedOption, SavingsProjection,
};
use crate::pipeline::heuristic::parse_amount;

/// Confidence assumed when the capability omits one.
pub const DEFAULT_CONFIDENCE: u8 = 50;

/// Hint attached to a page-level extraction, used by the merger to avoid
/// double counting: statements repeat grand totals on a summary page
/// distinct from brand-level detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTypeHint {
    Summary,
    Detail,
    FeeBreakdown,
    Other,
}

impl PageTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Detail => "detail",
            Self::FeeBreakdown => "fee_breakdown",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Some(Self::Summary),
            "detail" => Some(Self::Detail),
            "fee_breakdown" | "fee breakdown" | "fees" => Some(Self::FeeBreakdown),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Result of one structured extraction call.
#[derive(Debug, Clone, Default)]
pub struct StructuredExtraction {
    pub partial: PartialExtraction,
    pub page_type: Option<PageTypeHint>,
}

/// Coerce a raw capability response into a typed extraction.
///
/// Never fails: when no parseable JSON object is present the result is a
/// zero-confidence empty partial carrying an explanatory warning. Absent
/// numeric fields stay `None` internally; identity fields stay `None` —
/// the canonical record applies zero-defaults later.
pub fn parse_structured_response(response: &str, source_kind: DocumentKind) -> StructuredExtraction {
    let Some(json_str) = extract_first_json_object(response) else {
        return degraded(source_kind, "capability response contained no JSON object");
    };

    let value: Value = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => {
            return degraded(
                source_kind,
                &format!("capability JSON failed to parse: {e}"),
            )
        }
    };

    let Some(obj) = value.as_object() else {
        return degraded(source_kind, "capability JSON was not an object");
    };

    let mut partial = PartialExtraction {
        source_kind: Some(source_kind),
        merchant_name: get_string(obj, "merchant_name"),
        processor_name: get_string(obj, "processor_name"),
        statement_period: get_string(obj, "statement_period"),
        total_volume: get_number(obj, "total_volume"),
        total_transactions: get_number(obj, "total_transactions"),
        total_monthly_cost: get_number(obj, "total_monthly_cost"),
        ..Default::default()
    };

    if let Some(brands) = obj.get("card_breakdown").and_then(Value::as_object) {
        for brand in CardBrand::all() {
            if let Some(figures) = brands.get(brand.as_str()).and_then(Value::as_object) {
                let breakdown = partial.card_breakdown.get_mut(*brand);
                breakdown.volume = get_number(figures, "volume");
                breakdown.transaction_count = get_number(figures, "transaction_count");
                breakdown.rate_percent = get_number(figures, "rate_percent");
                breakdown.per_transaction_fee = get_number(figures, "per_transaction_fee");
                breakdown.total_cost = get_number(figures, "total_cost");
            }
        }
    }

    if let Some(fees) = obj.get("fees").and_then(Value::as_object) {
        partial.fees.interchange = get_number(fees, "interchange");
        partial.fees.assessments = get_number(fees, "assessments");
        partial.fees.processor_markup = get_number(fees, "processor_markup");
        partial.fees.monthly_fee = get_number(fees, "monthly_fee");
        partial.fees.pci_fee = get_number(fees, "pci_fee");
        partial.fees.batch_fee = get_number(fees, "batch_fee");
        partial.fees.other = get_number(fees, "other");
    }

    if let Some(options) = obj.get("proposed_options").and_then(Value::as_array) {
        // Lenient: an option that cannot be understood is skipped, not fatal.
        partial.options = options
            .iter()
            .filter_map(|v| v.as_object())
            .filter_map(parse_option)
            .collect();
    }

    partial.confidence = parse_confidence(obj);

    if let Some(note) = get_string(obj, "notes") {
        partial.warnings.push(note);
    }

    let page_type = get_string(obj, "page_type").and_then(|s| PageTypeHint::from_str(&s));

    StructuredExtraction { partial, page_type }
}

fn degraded(source_kind: DocumentKind, note: &str) -> StructuredExtraction {
    StructuredExtraction {
        partial: PartialExtraction {
            source_kind: Some(source_kind),
            confidence: 0,
            warnings: vec![note.to_string()],
            ..Default::default()
        },
        page_type: None,
    }
}

fn parse_option(obj: &Map<String, Value>) -> Option<ProposedOption> {
    let model_label = get_string(obj, "pricing_model")?;
    let model = match model_label.trim().to_ascii_lowercase().as_str() {
        "interchange_plus" | "interchange plus" | "ic+" => PricingModel::InterchangePlus {
            markup_percent: get_number(obj, "markup_percent"),
            per_transaction_fee: get_number(obj, "per_transaction_fee"),
            monthly_fee: get_number(obj, "monthly_fee"),
        },
        "dual_pricing" | "dual pricing" | "cash_discount" | "cash discount" => {
            PricingModel::DualPricing {
                card_price_uplift_percent: get_number(obj, "card_price_uplift_percent"),
                monthly_fee: get_number(obj, "monthly_fee"),
            }
        }
        _ => return None,
    };

    // Projection holds only the proposed cost here; savings are recomputed
    // by the merger against the merged current cost.
    let proposed_cost = get_number(obj, "proposed_monthly_cost").unwrap_or(0.0);
    Some(ProposedOption {
        model,
        projection: SavingsProjection {
            total_monthly_cost: proposed_cost,
            ..Default::default()
        },
    })
}

/// Accept confidence as 0–100, as a 0.0–1.0 fraction, or as a string.
fn parse_confidence(obj: &Map<String, Value>) -> u8 {
    let Some(raw) = get_number(obj, "confidence") else {
        return DEFAULT_CONFIDENCE;
    };
    let scaled = if raw > 0.0 && raw <= 1.0 { raw * 100.0 } else { raw };
    scaled.clamp(0.0, 100.0).round() as u8
}

fn get_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Numbers arrive as JSON numbers or as formatted strings ("$25,000.00").
fn get_number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_response() -> &'static str {
        r#"Here is what I found:
{
  "merchant_name": "Acme Auto Glass",
  "processor_name": null,
  "statement_period": "07/2025",
  "total_volume": 40000,
  "total_transactions": "250",
  "total_monthly_cost": "$1,500.00",
  "card_breakdown": {
    "visa": {"volume": 25000, "transaction_count": 152, "rate_percent": 2.5, "total_cost": 625},
    "mastercard": {"volume": "$15,000", "total_cost": 390}
  },
  "fees": {"interchange": 862.40, "monthly_fee": 9.95},
  "proposed_options": [
    {"pricing_model": "interchange_plus", "markup_percent": 0.30, "per_transaction_fee": 0.10, "monthly_fee": 9.95, "proposed_monthly_cost": 1187.55},
    {"pricing_model": "dual_pricing", "card_price_uplift_percent": 3.99, "proposed_monthly_cost": 49.00}
  ],
  "confidence": 82,
  "page_type": "summary"
}"#
    }

    #[test]
    fn parses_identity_and_totals() {
        let result = parse_structured_response(full_response(), DocumentKind::ProcessingStatement);
        let p = &result.partial;
        assert_eq!(p.merchant_name.as_deref(), Some("Acme Auto Glass"));
        // JSON null stays absent.
        assert_eq!(p.processor_name, None);
        assert_eq!(p.total_volume, Some(40_000.0));
        assert_eq!(p.total_transactions, Some(250.0));
        assert_eq!(p.total_monthly_cost, Some(1_500.0));
        assert_eq!(p.source_kind, Some(DocumentKind::ProcessingStatement));
    }

    #[test]
    fn parses_brand_figures_with_string_numbers() {
        let result = parse_structured_response(full_response(), DocumentKind::ProcessingStatement);
        let brands = &result.partial.card_breakdown;
        assert_eq!(brands.visa.volume, Some(25_000.0));
        assert_eq!(brands.visa.rate_percent, Some(2.5));
        assert_eq!(brands.mastercard.volume, Some(15_000.0));
        assert!(brands.discover.is_empty());
    }

    #[test]
    fn parses_proposed_options() {
        let result = parse_structured_response(full_response(), DocumentKind::ProposalDocument);
        let options = &result.partial.options;
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].model.label(), "interchange_plus");
        assert!((options[0].projection.total_monthly_cost - 1_187.55).abs() < 1e-9);
        assert_eq!(options[1].model.label(), "dual_pricing");
    }

    #[test]
    fn parses_page_type_and_confidence() {
        let result = parse_structured_response(full_response(), DocumentKind::ProcessingStatement);
        assert_eq!(result.page_type, Some(PageTypeHint::Summary));
        assert_eq!(result.partial.confidence, 82);
    }

    #[test]
    fn missing_confidence_defaults_to_50() {
        let result =
            parse_structured_response(r#"{"total_volume": 100}"#, DocumentKind::Unknown);
        assert_eq!(result.partial.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn fractional_confidence_scaled() {
        let result =
            parse_structured_response(r#"{"confidence": 0.85}"#, DocumentKind::Unknown);
        assert_eq!(result.partial.confidence, 85);
    }

    #[test]
    fn malformed_response_degrades_to_zero_confidence() {
        let result =
            parse_structured_response("Sorry, I could not read this document.", DocumentKind::Unknown);
        assert!(result.partial.is_empty());
        assert_eq!(result.partial.confidence, 0);
        assert!(result.partial.warnings[0].contains("no JSON object"));
    }

    #[test]
    fn broken_json_degrades_to_zero_confidence() {
        let result = parse_structured_response("{\"a\": }", DocumentKind::Unknown);
        assert_eq!(result.partial.confidence, 0);
        assert!(result.partial.warnings[0].contains("failed to parse"));
    }

    #[test]
    fn unknown_option_model_skipped() {
        let response = r#"{"proposed_options": [
            {"pricing_model": "flat_rate", "proposed_monthly_cost": 100},
            {"pricing_model": "dual_pricing", "proposed_monthly_cost": 80}
        ]}"#;
        let result = parse_structured_response(response, DocumentKind::ProposalDocument);
        assert_eq!(result.partial.options.len(), 1);
        assert_eq!(result.partial.options[0].model.label(), "dual_pricing");
    }

    #[test]
    fn absent_vs_zero_distinguished() {
        let response = r#"{"total_volume": 0, "card_breakdown": {"visa": {"volume": 0}}}"#;
        let result = parse_structured_response(response, DocumentKind::ProcessingStatement);
        // Observed zeros are Some(0.0); unobserved fields stay None.
        assert_eq!(result.partial.total_volume, Some(0.0));
        assert_eq!(result.partial.total_monthly_cost, None);
        assert_eq!(result.partial.card_breakdown.visa.volume, Some(0.0));
        assert_eq!(result.partial.card_breakdown.visa.total_cost, None);
    }

    #[test]
    fn notes_become_warnings() {
        let response = r#"{"notes": "second page was illegible", "confidence": 40}"#;
        let result = parse_structured_response(response, DocumentKind::ProcessingStatement);
        assert_eq!(result.partial.warnings.len(), 1);
        assert!(result.partial.warnings[0].contains("illegible"));
    }

    #[test]
    fn page_type_hint_roundtrip() {
        for hint in [
            PageTypeHint::Summary,
            PageTypeHint::Detail,
            PageTypeHint::FeeBreakdown,
            PageTypeHint::Other,
        ] {
            assert_eq!(PageTypeHint::from_str(hint.as_str()), Some(hint));
        }
        assert_eq!(PageTypeHint::from_str("Fee Breakdown"), Some(PageTypeHint::FeeBreakdown));
        assert_eq!(PageTypeHint::from_str("cover"), None);
    }
}
