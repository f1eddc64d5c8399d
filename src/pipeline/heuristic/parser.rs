//! Anchor/window parser for the legacy statement family.
//!
//! Each field has an ordered list of anchor regexes; the first match wins.
//! Brand figures are read from a bounded window after the brand name: the
//! first `$amount … rate% … $amount` triple is taken as volume / rate /
//! total cost. Everything here is pure string work — no I/O, no capability.

use std::sync::LazyLock;

use regex::Regex;

use super::numeric::parse_amount;
use crate::models::{CardBrand, DocumentKind, PartialExtraction};

/// Characters scanned after a brand anchor for its figure triple.
const BRAND_WINDOW: usize = 300;

/// Result of heuristic statement parsing. The savings line carries no
/// pricing parameters, so it stays a hint rather than a `ProposedOption`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtraction {
    pub partial: PartialExtraction,
    pub savings_hint: Option<f64>,
}

static MERCHANT_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)^\s*prepared for:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*merchant(?: name)?:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*dba:\s*(.+)$").unwrap(),
    ]
});

static PROCESSOR_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)^\s*processed by:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*processor:\s*(.+)$").unwrap(),
    ]
});

static PERIOD_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)statement period:\s*(.+)$").unwrap(),
        Regex::new(r"(?im)^\s*period:\s*(.+)$").unwrap(),
    ]
});

static TOTAL_FEES_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)total processing fees[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?im)total fees charged[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?im)total charges[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
    ]
});

static TOTAL_VOLUME_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)total (?:card )?(?:sales|volume)[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?im)amount submitted[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
    ]
});

static TOTAL_ITEMS_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)total (?:items|transactions)[:\s]*([\d,]+)").unwrap()]
});

static INTERCHANGE_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)total interchange(?: charges| fees)?[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap()]
});

static ASSESSMENT_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)(?:dues (?:and|&) )?assessments[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap()]
});

static MARKUP_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)processor markup[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?im)(?:total )?service charges[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
    ]
});

static MONTHLY_FEE_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)statement fee[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
        Regex::new(r"(?im)monthly (?:service )?fee[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap(),
    ]
});

static PCI_FEE_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)pci(?: compliance)?(?: fee)?[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap()]
});

static BATCH_FEE_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)batch (?:fee|header(?: fee)?)[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap()]
});

static SAVINGS_ANCHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?im)estimated monthly[^\n]*savings[:\s]*\$?\s*([\d,]+(?:\.\d+)?)").unwrap()]
});

/// First `$amount … rate% … $amount` triple inside a brand window.
static TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\s*([\d,]+(?:\.\d+)?)[\s\S]{0,80}?(\d+(?:\.\d+)?)\s*%[\s\S]{0,80}?\$\s*([\d,]+(?:\.\d+)?)",
    )
    .unwrap()
});

/// Transaction count inside a brand window ("152 items", "98 transactions").
static ITEM_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\s+(?:items?|transactions?|sales)").unwrap());

/// Per-item fee line ("Item Fee $0.10").
static ITEM_FEE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)item fee[:\s]*\$?\s*(\d+(?:\.\d+)?)").unwrap());

static BRAND_ANCHORS: LazyLock<Vec<(CardBrand, Regex)>> = LazyLock::new(|| {
    vec![
        (CardBrand::Visa, Regex::new(r"(?im)^\s*visa\b").unwrap()),
        (
            CardBrand::Mastercard,
            Regex::new(r"(?im)^\s*(?:mastercard|master card)\b").unwrap(),
        ),
        (CardBrand::Discover, Regex::new(r"(?im)^\s*discover\b").unwrap()),
        (
            CardBrand::Amex,
            Regex::new(r"(?im)^\s*(?:american express|amex)\b").unwrap(),
        ),
        (CardBrand::Debit, Regex::new(r"(?im)^\s*debit\b").unwrap()),
    ]
});

fn first_capture(anchors: &[Regex], text: &str) -> Option<String> {
    for re in anchors {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn first_amount(anchors: &[Regex], text: &str) -> Option<f64> {
    first_capture(anchors, text).and_then(|s| parse_amount(&s))
}

/// Parse already-decoded statement text.
///
/// `default_statement_fee` is substituted when the statement carries other
/// signals but no statement/monthly fee line — always accompanied by a
/// "default applied" warning so it can never pass as extracted data.
pub fn parse_statement(text: &str, default_statement_fee: f64) -> HeuristicExtraction {
    let mut partial = PartialExtraction {
        source_kind: Some(DocumentKind::ProcessingStatement),
        ..Default::default()
    };

    partial.merchant_name = first_capture(&MERCHANT_ANCHORS, text);
    partial.processor_name = first_capture(&PROCESSOR_ANCHORS, text);
    partial.statement_period = first_capture(&PERIOD_ANCHORS, text);

    partial.total_monthly_cost = first_amount(&TOTAL_FEES_ANCHORS, text);
    partial.total_volume = first_amount(&TOTAL_VOLUME_ANCHORS, text);
    partial.total_transactions = first_amount(&TOTAL_ITEMS_ANCHORS, text);

    partial.fees.interchange = first_amount(&INTERCHANGE_ANCHORS, text);
    partial.fees.assessments = first_amount(&ASSESSMENT_ANCHORS, text);
    partial.fees.processor_markup = first_amount(&MARKUP_ANCHORS, text);
    partial.fees.monthly_fee = first_amount(&MONTHLY_FEE_ANCHORS, text);
    partial.fees.pci_fee = first_amount(&PCI_FEE_ANCHORS, text);
    partial.fees.batch_fee = first_amount(&BATCH_FEE_ANCHORS, text);

    let per_txn_fee = ITEM_FEE
        .captures(text)
        .and_then(|c| parse_amount(c.get(1).map(|m| m.as_str()).unwrap_or("")));

    for (brand, anchor) in BRAND_ANCHORS.iter() {
        if let Some(m) = anchor.find(text) {
            let window_end = (m.end() + BRAND_WINDOW).min(text.len());
            let window = &text[m.end()..window_end];
            let breakdown = partial.card_breakdown.get_mut(*brand);

            if let Some(caps) = TRIPLE.captures(window) {
                breakdown.volume = parse_amount(caps.get(1).map(|c| c.as_str()).unwrap_or(""));
                breakdown.rate_percent =
                    parse_amount(caps.get(2).map(|c| c.as_str()).unwrap_or(""));
                breakdown.total_cost = parse_amount(caps.get(3).map(|c| c.as_str()).unwrap_or(""));
            }
            if let Some(caps) = ITEM_COUNT.captures(window) {
                breakdown.transaction_count =
                    parse_amount(caps.get(1).map(|c| c.as_str()).unwrap_or(""));
            }
            if breakdown.volume.is_some() {
                breakdown.per_transaction_fee = per_txn_fee;
            }
        }
    }

    // Fall back to summing observed brand figures when the grand total line
    // is missing.
    if partial.total_volume.is_none() {
        let brand_volume = partial.card_breakdown.total_volume();
        if brand_volume > 0.0 {
            partial.total_volume = Some(brand_volume);
        }
    }
    if partial.total_transactions.is_none() {
        let brand_count = partial.card_breakdown.total_transactions();
        if brand_count > 0.0 {
            partial.total_transactions = Some(brand_count);
        }
    }

    let anchored = !partial.is_empty();

    // Industry-default statement fee, tagged by an explicit warning: a
    // default must never be indistinguishable from an extracted figure.
    if anchored && partial.fees.monthly_fee.is_none() {
        partial.fees.monthly_fee = Some(default_statement_fee);
        partial.warnings.push(format!(
            "statement fee line not found; industry default ${default_statement_fee:.2} applied"
        ));
    }

    partial.confidence = if anchored { 90 } else { 0 };

    let savings_hint = first_amount(&SAVINGS_ANCHORS, text);

    HeuristicExtraction {
        partial,
        savings_hint,
    }
}
