use super::claim::FraudLevel;
use super::risk::{LossType, PaymentFrequency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One auditable step of a premium calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationFactor {
    pub factor_name: String,
    pub amount: f64,
    pub contributing_inputs: Vec<String>,
}

impl CalculationFactor {
    pub fn new(factor_name: &str, amount: f64, contributing_inputs: Vec<String>) -> Self {
        Self {
            factor_name: factor_name.to_string(),
            amount,
            contributing_inputs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Quoted,
    Referred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRating {
    Low,
    Medium,
    High,
}

/// Underwriting condition that needs manual review before the quote binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub code: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumQuote {
    pub base_premium: f64,
    pub net_premium: f64,
    pub tax_amount: f64,
    pub total_premium: f64,
    pub instalment_amount: f64,
    pub currency: String,
    pub payment_frequency: PaymentFrequency,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub status: QuoteStatus,
    pub risk_rating: RiskRating,
    pub referrals: Vec<Referral>,
    pub calculation_breakdown: Vec<CalculationFactor>,
}

impl PremiumQuote {
    pub fn factor(&self, name: &str) -> Option<&CalculationFactor> {
        self.calculation_breakdown
            .iter()
            .find(|factor| factor.factor_name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveModifierKind {
    Fraud,
    Liability,
    PartsBackorder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveModifier {
    pub name: ReserveModifierKind,
    pub amount: f64,
}

/// Half-open reporting bands over the final reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReserveBand {
    #[serde(rename = "£0-2k")]
    UpTo2k,
    #[serde(rename = "£2k-5k")]
    From2kTo5k,
    #[serde(rename = "£5k-10k")]
    From5kTo10k,
    #[serde(rename = "£10k-25k")]
    From10kTo25k,
    #[serde(rename = "£25k-50k")]
    From25kTo50k,
    #[serde(rename = "£50k+")]
    Above50k,
}

impl ReserveBand {
    pub fn for_amount(amount: f64) -> Self {
        match amount {
            a if a < 2_000.0 => ReserveBand::UpTo2k,
            a if a < 5_000.0 => ReserveBand::From2kTo5k,
            a if a < 10_000.0 => ReserveBand::From5kTo10k,
            a if a < 25_000.0 => ReserveBand::From10kTo25k,
            a if a < 50_000.0 => ReserveBand::From25kTo50k,
            _ => ReserveBand::Above50k,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReserveBand::UpTo2k => "£0-2k",
            ReserveBand::From2kTo5k => "£2k-5k",
            ReserveBand::From5kTo10k => "£5k-10k",
            ReserveBand::From10kTo25k => "£10k-25k",
            ReserveBand::From25kTo50k => "£25k-50k",
            ReserveBand::Above50k => "£50k+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveEstimate {
    pub loss_type: LossType,
    pub vehicle_value: f64,
    pub base_amount: f64,
    pub modifiers: Vec<ReserveModifier>,
    pub final_amount: f64,
    pub band: ReserveBand,
    pub breakdown: String,
}

impl ReserveEstimate {
    pub fn modifier(&self, kind: ReserveModifierKind) -> f64 {
        self.modifiers
            .iter()
            .filter(|modifier| modifier.name == kind)
            .map(|modifier| modifier.amount)
            .sum()
    }
}

/// Reserve result together with the claim it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveAssessment {
    pub claim_number: String,
    pub estimate: ReserveEstimate,
    pub fraud_score: f64,
    pub fraud_level: FraudLevel,
    pub recommendation: String,
}
