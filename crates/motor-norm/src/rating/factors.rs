use crate::canonical::{PrimaryUse, RiskArea, RiskProfile, Vehicle};
use crate::tables::{bracket_for, RatingTables};
use chrono::NaiveDate;

/// A multiplier together with the inputs that moved it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Factor {
    pub(crate) value: f64,
    pub(crate) inputs: Vec<String>,
}

impl Factor {
    fn neutral() -> Self {
        Self {
            value: 1.0,
            inputs: Vec::new(),
        }
    }

    fn adjust(&mut self, delta: f64, note: String) {
        self.value += delta;
        self.inputs.push(format!("{note}: {delta:+.2}"));
    }
}

pub(crate) fn vehicle_factor(tables: &RatingTables, vehicle: &Vehicle) -> Factor {
    let mut factor = Factor::neutral();

    if vehicle.model_year < tables.older_vehicle_before_year {
        factor.adjust(
            tables.older_vehicle_load,
            format!(
                "modelYear {} before {}",
                vehicle.model_year, tables.older_vehicle_before_year
            ),
        );
    }

    if let Some(bracket) = bracket_for(&tables.engine_brackets, vehicle.engine_displacement) {
        factor.adjust(
            bracket.load,
            format!(
                "engineDisplacement {}cc above {}cc",
                vehicle.engine_displacement, bracket.above
            ),
        );
    }

    let fuel = tables.fuel_adjustment(vehicle.fuel_type);
    if fuel != 0.0 {
        factor.adjust(fuel, format!("fuelType {}", label(&vehicle.fuel_type)));
    }

    factor
}

/// Wire-neutral name of a canonical enum value.
pub(crate) fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

/// Discount for consecutive claim-free years, capped.
pub fn no_claims_discount(tables: &RatingTables, no_claims_years: u32) -> f64 {
    (f64::from(no_claims_years) * tables.ncd_per_year).clamp(0.0, tables.ncd_cap)
}

pub(crate) struct DriverFactor {
    pub(crate) factor: Factor,
    pub(crate) no_claims_discount: f64,
    pub(crate) outstanding_points: u32,
}

pub(crate) fn driver_factor(
    tables: &RatingTables,
    profile: &RiskProfile,
    age: u32,
    today: NaiveDate,
) -> DriverFactor {
    let driver = &profile.driver;
    let mut factor = Factor::neutral();

    if age < tables.young_driver_under {
        factor.adjust(
            tables.young_driver_load,
            format!("age {age} under {}", tables.young_driver_under),
        );
    } else if age > tables.senior_driver_over {
        factor.adjust(
            tables.senior_driver_load,
            format!("age {age} over {}", tables.senior_driver_over),
        );
    }

    let ncd = no_claims_discount(tables, driver.no_claims_years);
    if ncd > 0.0 {
        factor.value *= 1.0 - ncd;
        factor.inputs.push(format!(
            "noClaimsYears {}: x{:.2}",
            driver.no_claims_years,
            1.0 - ncd
        ));
    }

    let points = driver.outstanding_points(today);
    if points > 0 {
        factor.adjust(
            f64::from(points) * tables.points_load,
            format!("penaltyPoints {points}"),
        );
    }

    DriverFactor {
        factor,
        no_claims_discount: ncd,
        outstanding_points: points,
    }
}

pub(crate) fn usage_factor(tables: &RatingTables, profile: &RiskProfile) -> Factor {
    let mut factor = Factor::neutral();
    let usage = &profile.usage;

    if let Some(bracket) = bracket_for(&tables.distance_brackets, usage.annual_distance) {
        factor.adjust(
            bracket.load,
            format!(
                "annualDistance {}km above {}km",
                usage.annual_distance, bracket.above
            ),
        );
    }

    if usage.primary_use == PrimaryUse::Business {
        factor.adjust(tables.business_use_load, "primaryUse business".to_string());
    }

    let flagged = profile.location.risk_area == Some(RiskArea::High);
    if flagged || tables.is_high_risk_postcode(&profile.location.postal_code) {
        factor.adjust(
            tables.high_risk_area_load,
            format!("postalCode {} high-risk", profile.location.postal_code),
        );
    }

    factor
}

/// Summed per-feature discounts; duplicates count once.
pub(crate) fn security_discount(tables: &RatingTables, vehicle: &Vehicle) -> Factor {
    let mut features = vehicle.security_features.clone();
    features.sort_by_key(|feature| *feature as u8);
    features.dedup();

    let mut discount = Factor {
        value: 0.0,
        inputs: Vec::new(),
    };
    for feature in features {
        discount.adjust(
            tables.security_discount(feature),
            format!("securityFeature {}", label(&feature)),
        );
    }
    discount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Market;

    #[test]
    fn ncd_is_capped_and_monotone() {
        let tables = RatingTables::for_market(Market::Germany);
        assert_eq!(no_claims_discount(&tables, 0), 0.0);
        assert!((no_claims_discount(&tables, 4) - 0.20).abs() < 1e-12);
        assert!((no_claims_discount(&tables, 14) - 0.70).abs() < 1e-12);
        assert_eq!(no_claims_discount(&tables, 40), 0.70);

        let mut previous = no_claims_discount(&tables, 60);
        for years in (0..60).rev() {
            let current = no_claims_discount(&tables, years);
            assert!(current <= previous);
            previous = current;
        }
    }
}
