//! Claim reserve estimation from the severity table.

mod adapter;
mod fraud;

pub use adapter::open_claims_exposure;
pub use fraud::{FraudAssessment, FraudScorer};

use crate::canonical::{
    round_money, ClaimNotification, FaultStatus, FraudLevel, LossType, ReserveAssessment,
    ReserveBand, ReserveEstimate, ReserveModifier, ReserveModifierKind,
};
use crate::error::CalculationError;
use crate::tables::{SeverityTable, ValueBracket};
use std::sync::Arc;

const FRAUD_LOAD: f64 = 0.10;
const LIABILITY_LOAD: f64 = 0.15;
const PARTS_LOAD: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskFlags {
    pub fraud_signals: bool,
    pub liability_uncertain: bool,
    pub parts_backorder: bool,
}

impl RiskFlags {
    /// Flags for a notified claim. A medium or worse fraud assessment raises the
    /// fraud flag even when the sender did not set it.
    pub fn for_claim(claim: &ClaimNotification, fraud: &FraudAssessment) -> Self {
        Self {
            fraud_signals: claim.fraud_signals || fraud.level >= FraudLevel::Medium,
            liability_uncertain: claim.fault_status == FaultStatus::Unknown,
            parts_backorder: claim.parts_backorder,
        }
    }
}

pub struct ReserveEngine {
    severity: Arc<SeverityTable>,
    fraud: FraudScorer,
}

impl ReserveEngine {
    pub fn new(severity: Arc<SeverityTable>) -> Self {
        Self {
            severity,
            fraud: FraudScorer,
        }
    }

    /// Base amount from the severity table plus additive modifiers, each a
    /// share of the base rather than of each other.
    pub fn estimate(
        &self,
        loss_type: LossType,
        vehicle_value: f64,
        flags: RiskFlags,
    ) -> Result<ReserveEstimate, CalculationError> {
        if !(vehicle_value.is_finite() && vehicle_value > 0.0) {
            return Err(CalculationError::InvalidVehicleValue);
        }

        let bracket = ValueBracket::for_value(vehicle_value);
        let base_amount = self.severity.base_amount(loss_type, bracket).ok_or(
            CalculationError::MissingSeverityEntry {
                loss: loss_type.label(),
                bracket: bracket.label(),
            },
        )?;

        let modifiers: Vec<ReserveModifier> = [
            (flags.fraud_signals, ReserveModifierKind::Fraud, FRAUD_LOAD),
            (flags.liability_uncertain, ReserveModifierKind::Liability, LIABILITY_LOAD),
            (flags.parts_backorder, ReserveModifierKind::PartsBackorder, PARTS_LOAD),
        ]
        .into_iter()
        .filter(|(applies, _, _)| *applies)
        .map(|(_, name, load)| ReserveModifier {
            name,
            amount: round_money(base_amount * load),
        })
        .collect();

        let final_amount =
            round_money(base_amount + modifiers.iter().map(|m| m.amount).sum::<f64>());

        Ok(ReserveEstimate {
            loss_type,
            vehicle_value,
            base_amount,
            breakdown: breakdown_line(base_amount, &modifiers, final_amount),
            modifiers,
            final_amount,
            band: ReserveBand::for_amount(final_amount),
        })
    }

    /// Scores fraud indicators, derives flags and estimates the reserve.
    pub fn assess(&self, claim: &ClaimNotification) -> Result<ReserveAssessment, CalculationError> {
        let fraud = self.fraud.assess(&claim.fraud_indicators);
        let flags = RiskFlags::for_claim(claim, &fraud);
        let estimate = self.estimate(claim.loss_type, claim.vehicle_value, flags)?;

        Ok(ReserveAssessment {
            claim_number: claim.claim_number.clone(),
            estimate,
            fraud_score: fraud.score,
            fraud_level: fraud.level,
            recommendation: fraud.recommendation.to_string(),
        })
    }
}

fn breakdown_line(base: f64, modifiers: &[ReserveModifier], final_amount: f64) -> String {
    let mut line = format!("Base Reserve: £{base:.2}");
    for modifier in modifiers {
        let label = match modifier.name {
            ReserveModifierKind::Fraud => "Fraud Risk",
            ReserveModifierKind::Liability => "Liability Uncertainty",
            ReserveModifierKind::PartsBackorder => "Parts Backorder",
        };
        line.push_str(&format!(" + {label}: £{:.2}", modifier.amount));
    }
    line.push_str(&format!(" = Final Reserve: £{final_amount:.2}"));
    line
}
