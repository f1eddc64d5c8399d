//! Field-by-field precedence merge.
//!
//! Rules, applied per field:
//! - identity: first non-null source, in precedence order;
//! - chunked totals: the first summary page wins once, detail pages never
//!   contribute to totals (statements repeat grand totals on summary pages —
//!   summing everything double counts);
//! - brand breakdowns: per-field maximum non-negative value;
//! - fee fields: highest non-zero value;
//! - conflicting non-zero totals between spreadsheet and statement: the
//!   configured precedence wins and the discarded value is logged.

use crate::config::{PipelineConfig, SourcePrecedence};
use crate::models::{
    CardBreakdowns, CurrentStateRecord, DocumentKind, ExtractionStatus, FeeBreakdown,
    MergedResult, PartialExtraction, ProposedOption, SavingsProjection, SourceOutcome,
};
use crate::pipeline::chunked::PageExtractionResult;
use crate::pipeline::structured::PageTypeHint;

pub struct Merger<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Merger<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn merge(
        &self,
        pricing: &SourceOutcome,
        statement: &SourceOutcome,
        pages: &[PageExtractionResult],
    ) -> MergedResult {
        let mut warnings: Vec<String> = Vec::new();

        // Failed paths are absorbed as warnings; the spreadsheet → statement
        // fallback gets its contractual explanation.
        if let SourceOutcome::Failed(reason) = pricing {
            if statement.as_extracted().is_some() {
                warnings.push(format!(
                    "pricing spreadsheet extraction failed ({reason}); falling back to statement extraction"
                ));
            } else {
                warnings.push(format!("pricing spreadsheet extraction failed: {reason}"));
            }
        }
        if let SourceOutcome::Failed(reason) = statement {
            warnings.push(format!("statement extraction failed: {reason}"));
        }

        let pricing_partial = pricing.as_extracted();
        let statement_partial = statement.as_extracted();
        let page_partial = merge_pages(pages);

        for partial in [pricing_partial, statement_partial, page_partial.as_ref()]
            .into_iter()
            .flatten()
        {
            warnings.extend(partial.warnings.iter().cloned());
        }

        // Precedence order for identity fields and totals.
        let ordered: Vec<&PartialExtraction> = match self.config.precedence {
            SourcePrecedence::PreferSpreadsheet => [pricing_partial, statement_partial]
                .into_iter()
                .flatten()
                .collect(),
            SourcePrecedence::PreferStatement => [statement_partial, pricing_partial]
                .into_iter()
                .flatten()
                .collect(),
        };
        let mut with_pages = ordered;
        if let Some(pages) = page_partial.as_ref() {
            with_pages.push(pages);
        }

        let merchant_name = first_identity(&with_pages, |p| p.merchant_name.clone());
        let processor_name = first_identity(&with_pages, |p| p.processor_name.clone());
        let statement_period = first_identity(&with_pages, |p| p.statement_period.clone());

        let total_volume = pick_total("total volume", &with_pages, |p| p.total_volume, &mut warnings);
        let total_transactions = pick_total(
            "total transactions",
            &with_pages,
            |p| p.total_transactions,
            &mut warnings,
        );
        let total_monthly_cost = pick_total(
            "total monthly cost",
            &with_pages,
            |p| p.total_monthly_cost,
            &mut warnings,
        );

        let mut card_breakdown = CardBreakdowns::default();
        let mut fees = FeeBreakdown::default();
        for partial in &with_pages {
            card_breakdown.merge_max(&partial.card_breakdown);
            fees.merge_highest(&partial.fees);
        }

        // Gap filling from components — never overrides an observed total.
        let total_volume = total_volume.or_else(|| nonzero(card_breakdown.total_volume()));
        let total_transactions =
            total_transactions.or_else(|| nonzero(card_breakdown.total_transactions()));
        let total_monthly_cost = total_monthly_cost.or_else(|| nonzero(fees.component_sum()));

        let mut current = CurrentStateRecord {
            merchant_name,
            processor_name,
            statement_period,
            total_volume: total_volume.unwrap_or(0.0),
            total_transactions: total_transactions.unwrap_or(0.0),
            total_monthly_cost: total_monthly_cost.unwrap_or(0.0),
            card_breakdown,
            fees,
            ..Default::default()
        };
        current.derive_metrics();

        let mut options: Vec<ProposedOption> = Vec::new();
        for partial in &with_pages {
            options.extend(partial.options.iter().cloned());
        }
        options.truncate(self.config.max_proposed_options);
        for option in &mut options {
            // Savings are only meaningful against the merged current cost.
            if option.projection.total_monthly_cost > 0.0 {
                option.projection = SavingsProjection::against(
                    current.total_monthly_cost,
                    option.projection.total_monthly_cost,
                );
            }
        }

        let mut document_kinds_seen: Vec<DocumentKind> = Vec::new();
        for partial in &with_pages {
            if let Some(kind) = partial.source_kind {
                if !document_kinds_seen.contains(&kind) {
                    document_kinds_seen.push(kind);
                }
            }
        }

        let confidence = merged_confidence(&with_pages, warnings.len());

        MergedResult {
            current,
            options,
            document_kinds_seen,
            warnings,
            // Provisional; the validator derives the real status.
            status: ExtractionStatus::Success,
            confidence,
        }
    }
}

fn first_identity(
    sources: &[&PartialExtraction],
    field: impl Fn(&PartialExtraction) -> Option<String>,
) -> Option<String> {
    sources.iter().find_map(|p| field(p))
}

/// First non-zero value in precedence order wins; later conflicting non-zero
/// values are logged, never silently dropped. Observed zeros only win when
/// no source saw anything better.
fn pick_total(
    label: &str,
    sources: &[&PartialExtraction],
    field: impl Fn(&PartialExtraction) -> Option<f64>,
    warnings: &mut Vec<String>,
) -> Option<f64> {
    let mut winner: Option<(f64, DocumentKind)> = None;
    let mut observed_zero = false;

    for partial in sources.iter().copied() {
        let Some(value) = field(partial) else { continue };
        if value == 0.0 {
            observed_zero = true;
            continue;
        }
        match winner {
            None => {
                winner = Some((value, partial.source_kind.unwrap_or(DocumentKind::Unknown)));
            }
            Some((kept, kept_kind)) => {
                if (value - kept).abs() > kept.abs() * 0.01 {
                    let kind = partial.source_kind.unwrap_or(DocumentKind::Unknown);
                    warnings.push(format!(
                        "{kind} reports {label} {value:.2}; {kept_kind} value {kept:.2} takes precedence"
                    ));
                }
            }
        }
    }

    match winner {
        Some((value, _)) => Some(value),
        None if observed_zero => Some(0.0),
        None => None,
    }
}

fn nonzero(value: f64) -> Option<f64> {
    if value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Collapse page results into one partial.
///
/// Totals: the first summary page wins once. Without a summary page, totals
/// stay unset here and are later filled from the merged components, which
/// cannot double count repeated pages. Brand and fee figures accumulate
/// across all successful pages under max / highest-non-zero rules.
fn merge_pages(pages: &[PageExtractionResult]) -> Option<PartialExtraction> {
    let successful: Vec<&PageExtractionResult> =
        pages.iter().filter(|p| p.success && p.data.is_some()).collect();
    if successful.is_empty() {
        return None;
    }

    let mut merged = PartialExtraction {
        source_kind: Some(DocumentKind::ProcessingStatement),
        ..Default::default()
    };

    for page in &successful {
        let data = page.data.as_ref().expect("filtered on data presence");
        merged.card_breakdown.merge_max(&data.card_breakdown);
        merged.fees.merge_highest(&data.fees);
        merged.warnings.extend(data.warnings.iter().cloned());
        merged.options.extend(data.options.iter().cloned());

        if merged.merchant_name.is_none() {
            merged.merchant_name = data.merchant_name.clone();
        }
        if merged.processor_name.is_none() {
            merged.processor_name = data.processor_name.clone();
        }
        if merged.statement_period.is_none() {
            merged.statement_period = data.statement_period.clone();
        }
    }

    if let Some(summary) = successful
        .iter()
        .find(|p| p.page_type == PageTypeHint::Summary)
    {
        let data = summary.data.as_ref().expect("filtered on data presence");
        merged.total_volume = data.total_volume;
        merged.total_transactions = data.total_transactions;
        merged.total_monthly_cost = data.total_monthly_cost;
    }

    merged.confidence = successful.iter().filter_map(|p| p.data.as_ref()).map(|d| d.confidence).max().unwrap_or(0);

    Some(merged)
}

/// Confidence of the merged record: the strongest contributing source,
/// discounted per accumulated warning.
fn merged_confidence(sources: &[&PartialExtraction], warning_count: usize) -> u8 {
    let base = sources.iter().map(|p| p.confidence).max().unwrap_or(0) as i32;
    let penalty = (warning_count as i32) * 5;
    (base - penalty).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardBreakdown;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn statement_partial() -> PartialExtraction {
        let mut partial = PartialExtraction {
            source_kind: Some(DocumentKind::ProcessingStatement),
            merchant_name: Some("Acme Auto Glass".into()),
            total_volume: Some(40_000.0),
            total_transactions: Some(250.0),
            total_monthly_cost: Some(1_500.0),
            confidence: 90,
            ..Default::default()
        };
        partial.card_breakdown.visa = CardBreakdown {
            volume: Some(25_000.0),
            transaction_count: Some(152.0),
            total_cost: Some(625.0),
            ..Default::default()
        };
        partial.card_breakdown.mastercard = CardBreakdown {
            volume: Some(15_000.0),
            total_cost: Some(390.0),
            ..Default::default()
        };
        partial
    }

    fn detail_page(index: usize, volume: f64) -> PageExtractionResult {
        PageExtractionResult {
            page_index: index,
            success: true,
            data: Some(PartialExtraction {
                source_kind: Some(DocumentKind::ProcessingStatement),
                total_volume: Some(volume),
                confidence: 70,
                ..Default::default()
            }),
            page_type: PageTypeHint::Detail,
            error: None,
        }
    }

    fn summary_page(index: usize, volume: f64) -> PageExtractionResult {
        PageExtractionResult {
            page_index: index,
            success: true,
            data: Some(PartialExtraction {
                source_kind: Some(DocumentKind::ProcessingStatement),
                total_volume: Some(volume),
                confidence: 80,
                ..Default::default()
            }),
            page_type: PageTypeHint::Summary,
            error: None,
        }
    }

    #[test]
    fn statement_only_merge() {
        let cfg = config();
        let merger = Merger::new(&cfg);
        let result = merger.merge(
            &SourceOutcome::Absent,
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );

        assert_eq!(result.current.merchant_name.as_deref(), Some("Acme Auto Glass"));
        assert!((result.current.total_volume - 40_000.0).abs() < 1e-9);
        assert!((result.current.effective_rate_percent - 3.75).abs() < 1e-9);
        assert_eq!(
            result.document_kinds_seen,
            vec![DocumentKind::ProcessingStatement]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn summary_page_precedence() {
        // Pages: detail 1,000 / summary 3,100 / detail 2,000.
        // Merged total volume must be 3,100 — not 3,000, not 6,100.
        let cfg = config();
        let merger = Merger::new(&cfg);
        let pages = vec![
            detail_page(0, 1_000.0),
            summary_page(1, 3_100.0),
            detail_page(2, 2_000.0),
        ];
        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &pages);
        assert!((result.current.total_volume - 3_100.0).abs() < 1e-9);
    }

    #[test]
    fn first_summary_page_wins_once() {
        let cfg = config();
        let merger = Merger::new(&cfg);
        let pages = vec![summary_page(0, 5_000.0), summary_page(1, 9_999.0)];
        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &pages);
        assert!((result.current.total_volume - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn no_summary_page_falls_back_to_components() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let mut page_a = detail_page(0, 0.0);
        if let Some(data) = page_a.data.as_mut() {
            data.total_volume = None;
            data.card_breakdown.visa.volume = Some(25_000.0);
            data.fees.interchange = Some(862.40);
        }
        let mut page_b = detail_page(1, 0.0);
        if let Some(data) = page_b.data.as_mut() {
            data.total_volume = None;
            data.card_breakdown.mastercard.volume = Some(15_000.0);
            data.fees.monthly_fee = Some(64.95);
        }

        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &[page_a, page_b]);
        assert!((result.current.total_volume - 40_000.0).abs() < 1e-9);
        assert!((result.current.total_monthly_cost - 927.35).abs() < 1e-6);
    }

    #[test]
    fn brand_merge_is_monotonic_across_pages() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let mut page_a = detail_page(0, 0.0);
        if let Some(data) = page_a.data.as_mut() {
            data.total_volume = None;
            data.card_breakdown.visa.volume = Some(10_000.0);
        }
        let mut page_b = detail_page(1, 0.0);
        if let Some(data) = page_b.data.as_mut() {
            data.total_volume = None;
            data.card_breakdown.visa.volume = Some(25_000.0);
        }

        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &[page_a, page_b]);
        // Max-wins: merged visa volume is never less than the larger partial.
        assert_eq!(result.current.card_breakdown.visa.volume, Some(25_000.0));
    }

    #[test]
    fn spreadsheet_precedence_with_conflict_logged() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let pricing = PartialExtraction {
            source_kind: Some(DocumentKind::PricingSpreadsheetInterchange),
            total_volume: Some(42_000.0),
            confidence: 75,
            ..Default::default()
        };

        let result = merger.merge(
            &SourceOutcome::Extracted(pricing),
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );

        // Spreadsheet wins the conflict, statement value is logged.
        assert!((result.current.total_volume - 42_000.0).abs() < 1e-9);
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.contains("40000.00") && w.contains("42000.00")),
            "conflict warning missing: {:?}",
            result.warnings
        );
        // Statement still fills the gaps the spreadsheet lacked.
        assert!((result.current.total_monthly_cost - 1_500.0).abs() < 1e-9);
        assert_eq!(result.current.merchant_name.as_deref(), Some("Acme Auto Glass"));
    }

    #[test]
    fn statement_precedence_when_configured() {
        let cfg = PipelineConfig {
            precedence: SourcePrecedence::PreferStatement,
            ..Default::default()
        };
        let merger = Merger::new(&cfg);

        let pricing = PartialExtraction {
            source_kind: Some(DocumentKind::PricingSpreadsheetInterchange),
            total_volume: Some(42_000.0),
            confidence: 75,
            ..Default::default()
        };

        let result = merger.merge(
            &SourceOutcome::Extracted(pricing),
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );
        assert!((result.current.total_volume - 40_000.0).abs() < 1e-9);
    }

    #[test]
    fn pricing_failure_falls_back_to_statement_with_warning() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let statement_only = merger.merge(
            &SourceOutcome::Absent,
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );
        let fallback = merger.merge(
            &SourceOutcome::Failed("spreadsheet unreadable".into()),
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );

        // Same record as statement-only output...
        assert_eq!(
            fallback.current.total_volume,
            statement_only.current.total_volume
        );
        assert_eq!(
            fallback.current.merchant_name,
            statement_only.current.merchant_name
        );
        assert_eq!(fallback.options.len(), statement_only.options.len());
        // ...plus the appended fallback warning.
        assert_eq!(fallback.warnings.len(), statement_only.warnings.len() + 1);
        assert!(fallback.warnings[0].contains("falling back to statement extraction"));
    }

    #[test]
    fn options_reprojected_against_merged_cost() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let mut pricing = PartialExtraction {
            source_kind: Some(DocumentKind::PricingSpreadsheetMixed),
            confidence: 80,
            ..Default::default()
        };
        pricing.options.push(ProposedOption {
            model: crate::models::PricingModel::InterchangePlus {
                markup_percent: Some(0.30),
                per_transaction_fee: Some(0.10),
                monthly_fee: Some(9.95),
            },
            projection: SavingsProjection {
                total_monthly_cost: 1_200.0,
                ..Default::default()
            },
        });

        let result = merger.merge(
            &SourceOutcome::Extracted(pricing),
            &SourceOutcome::Extracted(statement_partial()),
            &[],
        );

        let projection = &result.options[0].projection;
        assert!((projection.monthly_savings - 300.0).abs() < 1e-9);
        assert!((projection.annual_savings - 3_600.0).abs() < 1e-9);
        assert!((projection.savings_percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn failed_pages_excluded_from_merge() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let pages = vec![
            summary_page(0, 8_000.0),
            PageExtractionResult::failed(1, "timed out"),
        ];
        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &pages);
        assert!((result.current.total_volume - 8_000.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_extracted_yields_empty_record() {
        let cfg = config();
        let merger = Merger::new(&cfg);
        let result = merger.merge(&SourceOutcome::Absent, &SourceOutcome::Absent, &[]);
        assert_eq!(result.current.total_volume, 0.0);
        assert_eq!(result.confidence, 0);
        assert!(result.document_kinds_seen.is_empty());
    }

    #[test]
    fn upstream_warnings_accumulate() {
        let cfg = config();
        let merger = Merger::new(&cfg);

        let mut statement = statement_partial();
        statement
            .warnings
            .push("statement fee line not found; industry default $64.95 applied".into());

        let result = merger.merge(
            &SourceOutcome::Absent,
            &SourceOutcome::Extracted(statement),
            &[],
        );
        assert!(result.warnings.iter().any(|w| w.contains("industry default")));
    }
}
