//! Premium rating.
//!
//! `net = base x vehicle x driver x usage x (1 - security discount)`, with two
//! flat tax components on top. Every adjustment is kept in the quote's
//! calculation breakdown.

mod factors;
mod referrals;

pub use factors::no_claims_discount;
pub(crate) use factors::label;
pub(crate) use referrals::referral;

use crate::canonical::{
    round_money, CalculationFactor, CoverageRequest, PremiumQuote, QuoteStatus, RiskProfile,
    EARLIEST_MODEL_YEAR, MAX_DRIVER_AGE, MIN_DRIVER_AGE,
};
use crate::error::CalculationError;
use crate::runtime::Clock;
use crate::tables::RatingTables;
use chrono::{Datelike, Duration};

pub struct RatingEngine {
    tables: RatingTables,
}

impl RatingEngine {
    pub fn new(tables: RatingTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &RatingTables {
        &self.tables
    }

    pub fn quote(
        &self,
        profile: &RiskProfile,
        coverage: &CoverageRequest,
        clock: &dyn Clock,
    ) -> Result<PremiumQuote, CalculationError> {
        let tables = &self.tables;
        let today = clock.today();

        let age = profile
            .driver
            .age_on(today)
            .filter(|age| (MIN_DRIVER_AGE..=MAX_DRIVER_AGE).contains(age))
            .ok_or(CalculationError::DriverAgeOutOfRange)?;
        let year = profile.vehicle.model_year;
        if !(EARLIEST_MODEL_YEAR..=today.year() + 1).contains(&year) {
            return Err(CalculationError::ModelYearOutOfRange { year });
        }
        let value = profile.vehicle.declared_value;
        if !(value.is_finite() && value > 0.0) {
            return Err(CalculationError::InvalidVehicleValue);
        }

        let base_premium = tables.base_premium(coverage.cover_level);
        let vehicle = factors::vehicle_factor(tables, &profile.vehicle);
        let driver = factors::driver_factor(tables, profile, age, today);
        let usage = factors::usage_factor(tables, profile);
        let security = factors::security_discount(tables, &profile.vehicle);

        let net_premium = round_money(
            base_premium
                * vehicle.value
                * driver.factor.value
                * usage.value
                * (1.0 - security.value),
        );
        if !(net_premium.is_finite() && net_premium > 0.0) {
            return Err(CalculationError::NonPositiveAmount {
                stage: "net premium",
            });
        }

        let vat = round_money(net_premium * tables.taxes.vat);
        let premium_tax = round_money(net_premium * tables.taxes.insurance_premium_tax);
        let tax_amount = round_money(vat + premium_tax);
        let total_premium = round_money(net_premium + tax_amount);
        if !(total_premium.is_finite() && total_premium > 0.0) {
            return Err(CalculationError::NonPositiveAmount {
                stage: "total premium",
            });
        }

        let valid_from = today;
        let valid_to = today + Duration::days(i64::from(tables.validity_days));
        let instalments = coverage.payment_frequency.instalments_per_year();

        let referrals = referrals::referrals(profile, age, driver.outstanding_points);
        let risk_rating = referrals::risk_rating(profile, age, driver.outstanding_points);
        let status = if referrals.is_empty() {
            QuoteStatus::Quoted
        } else {
            QuoteStatus::Referred
        };

        let calculation_breakdown = vec![
            CalculationFactor::new(
                "basePremium",
                base_premium,
                vec![format!("coverLevel {}", label(&coverage.cover_level))],
            ),
            CalculationFactor::new("vehicleFactor", vehicle.value, vehicle.inputs),
            CalculationFactor::new(
                "noClaimsDiscount",
                driver.no_claims_discount,
                vec![format!("noClaimsYears {}", profile.driver.no_claims_years)],
            ),
            CalculationFactor::new("driverFactor", driver.factor.value, driver.factor.inputs),
            CalculationFactor::new("usageFactor", usage.value, usage.inputs),
            CalculationFactor::new("securityDiscount", security.value, security.inputs),
            CalculationFactor::new(
                "netPremium",
                net_premium,
                vec![
                    "basePremium".to_string(),
                    "vehicleFactor".to_string(),
                    "driverFactor".to_string(),
                    "usageFactor".to_string(),
                    "securityDiscount".to_string(),
                ],
            ),
            CalculationFactor::new(
                "vat",
                vat,
                vec![format!("rate {:.2}", tables.taxes.vat)],
            ),
            CalculationFactor::new(
                "insurancePremiumTax",
                premium_tax,
                vec![format!("rate {:.2}", tables.taxes.insurance_premium_tax)],
            ),
        ];

        Ok(PremiumQuote {
            base_premium,
            net_premium,
            tax_amount,
            total_premium,
            instalment_amount: round_money(total_premium / f64::from(instalments)),
            currency: tables.currency.to_string(),
            payment_frequency: coverage.payment_frequency,
            valid_from,
            valid_to,
            status,
            risk_rating,
            referrals,
            calculation_breakdown,
        })
    }
}
