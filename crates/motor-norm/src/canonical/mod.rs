//! Canonical risk model shared by every standard.
//!
//! Construction performs no validation; the norm validators own semantic checks.

mod claim;
mod envelope;
mod results;
mod risk;

pub use claim::{ClaimNotification, FraudIndicator, FraudLevel};
pub use envelope::MessageEnvelope;
pub use results::{
    CalculationFactor, PremiumQuote, QuoteStatus, Referral, ReserveAssessment, ReserveBand,
    ReserveEstimate, ReserveModifier, ReserveModifierKind, RiskRating,
};
pub use risk::{
    ClaimRecord, Conviction, CoverLevel, CoverageRequest, Driver, FaultStatus, FuelType,
    LicenceType, Location, LossType, MaritalStatus, ParkingLocation, PaymentFrequency,
    PrimaryUse, QuoteRequest, RiskArea, RiskProfile, SecurityFeature, Usage, Vehicle,
    POINTS_LOOKBACK_YEARS,
};

/// Insurable driver age range, inclusive.
pub const MIN_DRIVER_AGE: u32 = 17;
pub const MAX_DRIVER_AGE: u32 = 130;
/// Model years run from this year to one year past the evaluation date.
pub const EARLIEST_MODEL_YEAR: i32 = 1900;

/// Rounds a monetary amount to cents.
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries_are_half_open() {
        assert_eq!(ReserveBand::for_amount(1_999.99).label(), "£0-2k");
        assert_eq!(ReserveBand::for_amount(2_000.00).label(), "£2k-5k");
        assert_eq!(ReserveBand::for_amount(4_999.99).label(), "£2k-5k");
        assert_eq!(ReserveBand::for_amount(49_999.99).label(), "£25k-50k");
        assert_eq!(ReserveBand::for_amount(50_000.0).label(), "£50k+");
        assert_eq!(ReserveBand::for_amount(0.0).label(), "£0-2k");
    }

    #[test]
    fn band_serializes_as_label() {
        let json = serde_json::to_value(ReserveBand::From2kTo5k).expect("serializes");
        assert_eq!(json, serde_json::json!("£2k-5k"));
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(round_money(10.005_1), 10.01);
        assert_eq!(round_money(99.994), 99.99);
    }
}
