use super::{ReserveEngine, RiskFlags};
use crate::canonical::{FaultStatus, ReserveEstimate, RiskProfile};
use crate::error::CalculationError;

/// Reserves still held against the driver's unsettled claims, valued at the
/// vehicle now being rated. This is the only path from a risk profile into
/// the reserve engine; quotes never reuse reserve inputs directly.
pub fn open_claims_exposure(
    engine: &ReserveEngine,
    profile: &RiskProfile,
) -> Result<Vec<ReserveEstimate>, CalculationError> {
    profile
        .driver
        .claims_history
        .iter()
        .filter(|claim| !claim.settled)
        .map(|claim| {
            let flags = RiskFlags {
                liability_uncertain: claim.fault_status == FaultStatus::Unknown,
                ..RiskFlags::default()
            };
            engine.estimate(claim.loss_type, profile.vehicle.declared_value, flags)
        })
        .collect()
}
