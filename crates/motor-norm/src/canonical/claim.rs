use super::risk::{FaultStatus, LossType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical form of a reserve request: one notified loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimNotification {
    pub claim_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    pub loss_type: LossType,
    /// Actual cash value of the insured vehicle.
    pub vehicle_value: f64,
    pub fault_status: FaultStatus,
    #[serde(default)]
    pub fraud_signals: bool,
    #[serde(default)]
    pub parts_backorder: bool,
    #[serde(default)]
    pub fraud_indicators: Vec<FraudIndicator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudIndicator {
    LateReporting,
    MultipleClaims,
    HighValueForType,
    InconsistentStory,
    NoPoliceReport,
    SuspiciousTiming,
    UnusualLocation,
    PriorFraudHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudLevel {
    Minimal,
    Low,
    Medium,
    High,
}
