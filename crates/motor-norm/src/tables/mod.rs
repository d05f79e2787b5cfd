//! Read-only rating and severity tables.

mod severity;

pub use severity::{SeverityTable, TableError, ValueBracket};

use crate::canonical::{CoverLevel, FuelType, SecurityFeature};
use serde::{Deserialize, Serialize};

/// Jurisdiction whose tariff applies to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Germany,
    Netherlands,
}

impl Market {
    pub fn country_code(self) -> &'static str {
        match self {
            Market::Germany => "DE",
            Market::Netherlands => "NL",
        }
    }
}

/// Surcharge applied when a value is strictly above `above`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurchargeBracket {
    pub above: u32,
    pub load: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxRates {
    /// VAT-equivalent component.
    pub vat: f64,
    pub insurance_premium_tax: f64,
}

/// Multipliers, brackets and tax rates for one market.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTables {
    pub market: Market,
    pub currency: &'static str,
    pub base_third_party: f64,
    pub base_third_party_fire_theft: f64,
    pub base_comprehensive: f64,
    pub older_vehicle_before_year: i32,
    pub older_vehicle_load: f64,
    /// Highest threshold first.
    pub engine_brackets: Vec<SurchargeBracket>,
    pub electric_adjustment: f64,
    pub hybrid_adjustment: f64,
    pub diesel_adjustment: f64,
    pub young_driver_under: u32,
    pub young_driver_load: f64,
    pub senior_driver_over: u32,
    pub senior_driver_load: f64,
    pub ncd_per_year: f64,
    pub ncd_cap: f64,
    pub points_load: f64,
    /// Highest threshold first.
    pub distance_brackets: Vec<SurchargeBracket>,
    pub business_use_load: f64,
    pub high_risk_area_load: f64,
    pub high_risk_postal_prefixes: Vec<&'static str>,
    pub alarm_discount: f64,
    pub immobiliser_discount: f64,
    pub tracking_discount: f64,
    pub taxes: TaxRates,
    pub validity_days: u32,
}

pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

impl RatingTables {
    pub fn for_market(market: Market) -> Self {
        let (taxes, high_risk_postal_prefixes) = match market {
            Market::Germany => (
                TaxRates {
                    vat: 0.0,
                    insurance_premium_tax: 0.19,
                },
                Vec::new(),
            ),
            Market::Netherlands => (
                TaxRates {
                    vat: 0.21,
                    insurance_premium_tax: 0.21,
                },
                vec!["10", "20", "30", "40"],
            ),
        };

        Self {
            market,
            currency: "EUR",
            base_third_party: 400.0,
            base_third_party_fire_theft: 480.0,
            base_comprehensive: 620.0,
            older_vehicle_before_year: 2015,
            older_vehicle_load: 0.15,
            engine_brackets: vec![
                SurchargeBracket {
                    above: 2000,
                    load: 0.25,
                },
                SurchargeBracket {
                    above: 1600,
                    load: 0.10,
                },
            ],
            electric_adjustment: -0.10,
            hybrid_adjustment: -0.05,
            diesel_adjustment: 0.05,
            young_driver_under: 25,
            young_driver_load: 0.50,
            senior_driver_over: 65,
            senior_driver_load: 0.15,
            ncd_per_year: 0.05,
            ncd_cap: 0.70,
            points_load: 0.05,
            distance_brackets: vec![
                SurchargeBracket {
                    above: 20_000,
                    load: 0.20,
                },
                SurchargeBracket {
                    above: 15_000,
                    load: 0.10,
                },
            ],
            business_use_load: 0.15,
            high_risk_area_load: 0.25,
            high_risk_postal_prefixes,
            alarm_discount: 0.05,
            immobiliser_discount: 0.03,
            tracking_discount: 0.07,
            taxes,
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }

    pub fn with_validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    pub fn base_premium(&self, cover: CoverLevel) -> f64 {
        match cover {
            CoverLevel::ThirdParty => self.base_third_party,
            CoverLevel::ThirdPartyFireTheft => self.base_third_party_fire_theft,
            CoverLevel::Comprehensive => self.base_comprehensive,
        }
    }

    pub fn fuel_adjustment(&self, fuel: FuelType) -> f64 {
        match fuel {
            FuelType::Electric => self.electric_adjustment,
            FuelType::Hybrid => self.hybrid_adjustment,
            FuelType::Diesel => self.diesel_adjustment,
            FuelType::Petrol | FuelType::Lpg => 0.0,
        }
    }

    pub fn security_discount(&self, feature: SecurityFeature) -> f64 {
        match feature {
            SecurityFeature::Alarm => self.alarm_discount,
            SecurityFeature::Immobiliser => self.immobiliser_discount,
            SecurityFeature::Tracking => self.tracking_discount,
        }
    }

    pub fn is_high_risk_postcode(&self, postal_code: &str) -> bool {
        let normalized = postal_code.trim();
        self.high_risk_postal_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix))
    }
}

/// First bracket whose threshold `value` exceeds.
pub fn bracket_for(brackets: &[SurchargeBracket], value: u32) -> Option<SurchargeBracket> {
    brackets.iter().copied().find(|bracket| value > bracket.above)
}
