//! The normalized "as-is" snapshot of a merchant's processing costs.
//!
//! Internal partials keep every figure as `Option<f64>` so "not observed"
//! and "observed as zero" stay distinguishable until the canonical record is
//! built, where absent values default to 0 for downstream convenience.

use serde::{Deserialize, Serialize};

/// Card brands tracked per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Discover,
    Amex,
    Debit,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Discover => "discover",
            Self::Amex => "amex",
            Self::Debit => "debit",
        }
    }

    pub fn all() -> &'static [CardBrand] {
        &[
            Self::Visa,
            Self::Mastercard,
            Self::Discover,
            Self::Amex,
            Self::Debit,
        ]
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize an unobserved figure as 0 — the external record trades the
/// absent-vs-zero distinction for downstream convenience. Internally the
/// `Option` is preserved.
mod zero_default {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.unwrap_or(0.0))
    }
}

/// Per-brand figures. `None` means "not observed on any document", which is
/// different from an observed zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardBreakdown {
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub volume: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub transaction_count: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub rate_percent: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub per_transaction_fee: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub total_cost: Option<f64>,
}

impl CardBreakdown {
    pub fn is_empty(&self) -> bool {
        self.volume.is_none()
            && self.transaction_count.is_none()
            && self.rate_percent.is_none()
            && self.per_transaction_fee.is_none()
            && self.total_cost.is_none()
    }

    /// Field-wise maximum of non-negative observed values.
    ///
    /// A brand's true figure never shrinks across partial views of the same
    /// statement, so the larger observation is always at least as complete.
    pub fn merge_max(&mut self, other: &CardBreakdown) {
        merge_field_max(&mut self.volume, other.volume);
        merge_field_max(&mut self.transaction_count, other.transaction_count);
        merge_field_max(&mut self.rate_percent, other.rate_percent);
        merge_field_max(&mut self.per_transaction_fee, other.per_transaction_fee);
        merge_field_max(&mut self.total_cost, other.total_cost);
    }
}

fn merge_field_max(into: &mut Option<f64>, from: Option<f64>) {
    let Some(candidate) = from else { return };
    if candidate < 0.0 {
        return;
    }
    match into {
        Some(current) if *current >= candidate => {}
        _ => *into = Some(candidate),
    }
}

/// All tracked brands in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardBreakdowns {
    pub visa: CardBreakdown,
    pub mastercard: CardBreakdown,
    pub discover: CardBreakdown,
    pub amex: CardBreakdown,
    pub debit: CardBreakdown,
}

impl CardBreakdowns {
    pub fn get(&self, brand: CardBrand) -> &CardBreakdown {
        match brand {
            CardBrand::Visa => &self.visa,
            CardBrand::Mastercard => &self.mastercard,
            CardBrand::Discover => &self.discover,
            CardBrand::Amex => &self.amex,
            CardBrand::Debit => &self.debit,
        }
    }

    pub fn get_mut(&mut self, brand: CardBrand) -> &mut CardBreakdown {
        match brand {
            CardBrand::Visa => &mut self.visa,
            CardBrand::Mastercard => &mut self.mastercard,
            CardBrand::Discover => &mut self.discover,
            CardBrand::Amex => &mut self.amex,
            CardBrand::Debit => &mut self.debit,
        }
    }

    pub fn merge_max(&mut self, other: &CardBreakdowns) {
        for brand in CardBrand::all() {
            self.get_mut(*brand).merge_max(other.get(*brand));
        }
    }

    /// Sum of observed per-brand volumes (absent brands contribute nothing).
    pub fn total_volume(&self) -> f64 {
        CardBrand::all()
            .iter()
            .filter_map(|b| self.get(*b).volume)
            .sum()
    }

    pub fn total_transactions(&self) -> f64 {
        CardBrand::all()
            .iter()
            .filter_map(|b| self.get(*b).transaction_count)
            .sum()
    }
}

/// Named monthly fee components. All optional: a statement rarely itemizes
/// every line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub interchange: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub assessments: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub processor_markup: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub monthly_fee: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub pci_fee: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub batch_fee: Option<f64>,
    #[serde(default, serialize_with = "zero_default::serialize")]
    pub other: Option<f64>,
}

impl FeeBreakdown {
    pub fn is_empty(&self) -> bool {
        self.component_sum() == 0.0
            && self.interchange.is_none()
            && self.assessments.is_none()
            && self.processor_markup.is_none()
            && self.monthly_fee.is_none()
            && self.pci_fee.is_none()
            && self.batch_fee.is_none()
            && self.other.is_none()
    }

    /// Sum of the components that were observed.
    pub fn component_sum(&self) -> f64 {
        [
            self.interchange,
            self.assessments,
            self.processor_markup,
            self.monthly_fee,
            self.pci_fee,
            self.batch_fee,
            self.other,
        ]
        .iter()
        .flatten()
        .sum()
    }

    /// Per-field merge where the highest non-zero value wins. A partial view
    /// must never overwrite a more complete one with zero.
    pub fn merge_highest(&mut self, other: &FeeBreakdown) {
        merge_field_highest_nonzero(&mut self.interchange, other.interchange);
        merge_field_highest_nonzero(&mut self.assessments, other.assessments);
        merge_field_highest_nonzero(&mut self.processor_markup, other.processor_markup);
        merge_field_highest_nonzero(&mut self.monthly_fee, other.monthly_fee);
        merge_field_highest_nonzero(&mut self.pci_fee, other.pci_fee);
        merge_field_highest_nonzero(&mut self.batch_fee, other.batch_fee);
        merge_field_highest_nonzero(&mut self.other, other.other);
    }
}

fn merge_field_highest_nonzero(into: &mut Option<f64>, from: Option<f64>) {
    let Some(candidate) = from else { return };
    match into {
        Some(current) if *current >= candidate && *current != 0.0 => {}
        Some(current) if candidate == 0.0 && *current != 0.0 => {}
        _ => *into = Some(candidate),
    }
}

/// The canonical current-cost snapshot. Derived metrics are recomputed via
/// [`CurrentStateRecord::derive_metrics`]; absent figures are serialized as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentStateRecord {
    pub merchant_name: Option<String>,
    pub processor_name: Option<String>,
    pub statement_period: Option<String>,
    pub total_volume: f64,
    pub total_transactions: f64,
    /// Derived: total_volume / total_transactions (0 when no transactions).
    pub avg_ticket: f64,
    pub card_breakdown: CardBreakdowns,
    pub fees: FeeBreakdown,
    pub total_monthly_cost: f64,
    /// Derived: total_monthly_cost / total_volume × 100 (0 when no volume).
    pub effective_rate_percent: f64,
}

impl CurrentStateRecord {
    /// Recompute `avg_ticket` and `effective_rate_percent` from the totals.
    pub fn derive_metrics(&mut self) {
        self.avg_ticket = if self.total_transactions > 0.0 {
            self.total_volume / self.total_transactions
        } else {
            0.0
        };
        self.effective_rate_percent = if self.total_volume > 0.0 {
            self.total_monthly_cost / self.total_volume * 100.0
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_brand_as_str() {
        assert_eq!(CardBrand::Visa.as_str(), "visa");
        assert_eq!(CardBrand::Amex.to_string(), "amex");
        assert_eq!(CardBrand::all().len(), 5);
    }

    #[test]
    fn merge_max_takes_larger_value() {
        let mut a = CardBreakdown {
            volume: Some(1_000.0),
            ..Default::default()
        };
        let b = CardBreakdown {
            volume: Some(2_500.0),
            transaction_count: Some(40.0),
            ..Default::default()
        };
        a.merge_max(&b);
        assert_eq!(a.volume, Some(2_500.0));
        assert_eq!(a.transaction_count, Some(40.0));
    }

    #[test]
    fn merge_max_never_shrinks() {
        // Merge monotonicity: if B's volume >= A's, the merged volume is
        // never less than B's.
        let mut a = CardBreakdown {
            volume: Some(5_000.0),
            ..Default::default()
        };
        let b = CardBreakdown {
            volume: Some(5_000.0),
            ..Default::default()
        };
        a.merge_max(&b);
        assert_eq!(a.volume, Some(5_000.0));

        let smaller = CardBreakdown {
            volume: Some(100.0),
            ..Default::default()
        };
        a.merge_max(&smaller);
        assert_eq!(a.volume, Some(5_000.0));
    }

    #[test]
    fn merge_max_ignores_negative_values() {
        let mut a = CardBreakdown::default();
        let b = CardBreakdown {
            volume: Some(-50.0),
            ..Default::default()
        };
        a.merge_max(&b);
        assert_eq!(a.volume, None);
    }

    #[test]
    fn merge_max_keeps_observed_zero_over_absent() {
        let mut a = CardBreakdown {
            volume: Some(0.0),
            ..Default::default()
        };
        a.merge_max(&CardBreakdown::default());
        assert_eq!(a.volume, Some(0.0));
    }

    #[test]
    fn fee_merge_highest_nonzero_wins() {
        let mut a = FeeBreakdown {
            interchange: Some(0.0),
            monthly_fee: Some(64.95),
            ..Default::default()
        };
        let b = FeeBreakdown {
            interchange: Some(447.50),
            monthly_fee: Some(0.0),
            pci_fee: Some(19.95),
            ..Default::default()
        };
        a.merge_highest(&b);
        assert_eq!(a.interchange, Some(447.50));
        // Zero must not clobber a real value.
        assert_eq!(a.monthly_fee, Some(64.95));
        assert_eq!(a.pci_fee, Some(19.95));
    }

    #[test]
    fn fee_component_sum_skips_absent() {
        let fees = FeeBreakdown {
            interchange: Some(400.0),
            monthly_fee: Some(64.95),
            ..Default::default()
        };
        assert!((fees.component_sum() - 464.95).abs() < 1e-9);
    }

    #[test]
    fn derive_metrics_avg_ticket_and_rate() {
        let mut record = CurrentStateRecord {
            total_volume: 40_000.0,
            total_transactions: 250.0,
            total_monthly_cost: 1_500.0,
            ..Default::default()
        };
        record.derive_metrics();
        assert!((record.avg_ticket - 160.0).abs() < 1e-9);
        assert!((record.effective_rate_percent - 3.75).abs() < 1e-9);
    }

    #[test]
    fn derive_metrics_consistency() {
        // avg_ticket * transactions ≈ volume for any record with
        // transactions > 0.
        let mut record = CurrentStateRecord {
            total_volume: 123_456.78,
            total_transactions: 777.0,
            ..Default::default()
        };
        record.derive_metrics();
        let reconstructed = record.avg_ticket * record.total_transactions;
        assert!((reconstructed - record.total_volume).abs() < 1e-6);
    }

    #[test]
    fn derive_metrics_zero_guards() {
        let mut record = CurrentStateRecord::default();
        record.derive_metrics();
        assert_eq!(record.avg_ticket, 0.0);
        assert_eq!(record.effective_rate_percent, 0.0);
    }

    #[test]
    fn unobserved_fields_serialize_as_zero() {
        let breakdown = CardBreakdown {
            volume: Some(25_000.0),
            ..Default::default()
        };
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["volume"], 25_000.0);
        assert_eq!(json["total_cost"], 0.0);
        assert_eq!(json["rate_percent"], 0.0);

        let fees = FeeBreakdown::default();
        let json = serde_json::to_value(&fees).unwrap();
        assert_eq!(json["interchange"], 0.0);
    }

    #[test]
    fn breakdowns_totals_sum_observed_brands() {
        let mut breakdowns = CardBreakdowns::default();
        breakdowns.visa.volume = Some(25_000.0);
        breakdowns.mastercard.volume = Some(15_000.0);
        breakdowns.visa.transaction_count = Some(152.0);
        assert!((breakdowns.total_volume() - 40_000.0).abs() < 1e-9);
        assert!((breakdowns.total_transactions() - 152.0).abs() < 1e-9);
    }
}
