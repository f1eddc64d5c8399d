//! Plausibility validation.
//!
//! Stateless, additive rules over the merged record. Findings are never
//! errors: they become warnings on a completed result, and the warning
//! count derives the overall status. Simple, inspectable thresholds — not a
//! learned score.

use crate::models::{CurrentStateRecord, ExtractionStatus, MergedResult, ProposedOption};

/// Documented sanity ceiling for card-processing effective rates.
pub const MAX_PLAUSIBLE_EFFECTIVE_RATE: f64 = 10.0;

/// Tolerated divergence between itemized fee components and the stated
/// total before the reconciliation rule fires.
const FEE_RECONCILE_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub status: ExtractionStatus,
}

/// Run every rule independently and derive the status from the number of
/// findings: 0 → success, 1–2 → partial, 3+ → needs_review.
pub fn validate(record: &CurrentStateRecord, options: &[ProposedOption]) -> ValidationReport {
    let mut warnings = Vec::new();

    if record.total_volume > 0.0 && record.total_monthly_cost == 0.0 {
        warnings.push(
            "volume present but total monthly cost computed to zero; verify fee computation"
                .to_string(),
        );
    }

    if record.effective_rate_percent > MAX_PLAUSIBLE_EFFECTIVE_RATE {
        warnings.push(format!(
            "effective rate {:.2}% is implausibly high (> {MAX_PLAUSIBLE_EFFECTIVE_RATE}%), verify",
            record.effective_rate_percent
        ));
    }

    for option in options {
        if option.projection.monthly_savings < 0.0 {
            warnings.push(format!(
                "proposed {} option appears more expensive than current pricing, verify",
                option.model.label()
            ));
        }
    }

    if record.total_volume == 0.0 && record.total_transactions == 0.0 {
        warnings.push("no usable data extracted".to_string());
    }

    if record.merchant_name.is_none() {
        warnings.push("merchant name missing".to_string());
    }

    // Fee-sum reconciliation: itemized components should agree with the
    // stated total when both exist. A mismatch is a signal, not an error.
    let component_sum = record.fees.component_sum();
    if component_sum > 0.0 && record.total_monthly_cost > 0.0 {
        let divergence =
            (component_sum - record.total_monthly_cost).abs() / record.total_monthly_cost;
        if divergence > FEE_RECONCILE_TOLERANCE {
            warnings.push(format!(
                "itemized fees ({component_sum:.2}) do not reconcile with stated total ({:.2})",
                record.total_monthly_cost
            ));
        }
    }

    let status = status_for(warnings.len());
    ValidationReport { warnings, status }
}

/// Apply validation to a merged result in place: warnings are appended and
/// the provisional status replaced.
pub fn apply(result: &mut MergedResult) {
    let report = validate(&result.current, &result.options);
    result.warnings.extend(report.warnings);
    result.status = report.status;
}

fn status_for(warning_count: usize) -> ExtractionStatus {
    match warning_count {
        0 => ExtractionStatus::Success,
        1..=2 => ExtractionStatus::Partial,
        _ => ExtractionStatus::NeedsReview,
    }
}
