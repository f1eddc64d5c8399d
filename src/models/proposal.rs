use serde::{Deserialize, Serialize};

/// Parameters of one proposed pricing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingModel {
    /// Merchant pays actual interchange plus a fixed markup.
    InterchangePlus {
        markup_percent: Option<f64>,
        per_transaction_fee: Option<f64>,
        monthly_fee: Option<f64>,
    },
    /// Separate cash and card prices; card cost passed through per sale.
    DualPricing {
        card_price_uplift_percent: Option<f64>,
        monthly_fee: Option<f64>,
    },
}

impl PricingModel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InterchangePlus { .. } => "interchange_plus",
            Self::DualPricing { .. } => "dual_pricing",
        }
    }
}

/// Projected cost and savings of one option against the current state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsProjection {
    pub total_monthly_cost: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub savings_percent: f64,
}

impl SavingsProjection {
    /// Build a projection from the proposed monthly cost against the current
    /// monthly cost. Savings may legitimately be negative — flagged by the
    /// validator, never clamped here.
    pub fn against(current_monthly_cost: f64, proposed_monthly_cost: f64) -> Self {
        let monthly_savings = current_monthly_cost - proposed_monthly_cost;
        let savings_percent = if current_monthly_cost > 0.0 {
            monthly_savings / current_monthly_cost * 100.0
        } else {
            0.0
        };
        Self {
            total_monthly_cost: proposed_monthly_cost,
            monthly_savings,
            annual_savings: monthly_savings * 12.0,
            savings_percent,
        }
    }
}

/// One proposed pricing option. The merge stage collects options without
/// ranking them — ordering is a downstream concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedOption {
    pub model: PricingModel,
    pub projection: SavingsProjection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_basic_savings() {
        let p = SavingsProjection::against(1_500.0, 1_200.0);
        assert!((p.monthly_savings - 300.0).abs() < 1e-9);
        assert!((p.annual_savings - 3_600.0).abs() < 1e-9);
        assert!((p.savings_percent - 20.0).abs() < 1e-9);
        assert!((p.total_monthly_cost - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn projection_negative_savings_preserved() {
        let p = SavingsProjection::against(1_000.0, 1_250.0);
        assert!((p.monthly_savings + 250.0).abs() < 1e-9);
        assert!((p.annual_savings + 3_000.0).abs() < 1e-9);
        assert!(p.savings_percent < 0.0);
    }

    #[test]
    fn projection_zero_current_cost() {
        let p = SavingsProjection::against(0.0, 500.0);
        assert_eq!(p.savings_percent, 0.0);
        assert!((p.monthly_savings + 500.0).abs() < 1e-9);
    }

    #[test]
    fn pricing_model_labels() {
        let ip = PricingModel::InterchangePlus {
            markup_percent: Some(0.30),
            per_transaction_fee: Some(0.10),
            monthly_fee: Some(9.95),
        };
        assert_eq!(ip.label(), "interchange_plus");

        let dp = PricingModel::DualPricing {
            card_price_uplift_percent: Some(3.99),
            monthly_fee: Some(49.0),
        };
        assert_eq!(dp.label(), "dual_pricing");
    }

    #[test]
    fn pricing_model_serde_tagging() {
        let ip = PricingModel::InterchangePlus {
            markup_percent: Some(0.25),
            per_transaction_fee: None,
            monthly_fee: None,
        };
        let json = serde_json::to_string(&ip).unwrap();
        assert!(json.contains("\"type\":\"interchange_plus\""));
        let parsed: PricingModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ip);
    }
}
