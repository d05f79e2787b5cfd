//! Shared fixtures for unit tests.

use crate::canonical::{
    CoverLevel, CoverageRequest, Driver, FuelType, LicenceType, Location, PaymentFrequency,
    PrimaryUse, QuoteRequest, RiskProfile, Usage, Vehicle,
};
use crate::config::NormConfig;
use crate::runtime::FixedClock;
use chrono::NaiveDate;
use std::time::Duration;
use url::Url;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(crate) fn clock() -> FixedClock {
    FixedClock::at_midnight(date(2026, 10, 17))
}

pub(crate) fn norm_config() -> NormConfig {
    NormConfig {
        sender_id: "MOTOR-NORM".to_string(),
        outbound_timeout: Duration::from_secs(5),
        quote_validity_days: 30,
        deeplink_base_url: Url::parse("https://portal.example.com/access").expect("url"),
        severity_table: None,
    }
}

/// 22-year-old driver, 2019 petrol hatchback, no history.
pub(crate) fn young_driver_profile() -> RiskProfile {
    RiskProfile {
        vehicle: Vehicle {
            make: "Volkswagen".to_string(),
            model: "Golf".to_string(),
            model_year: 2019,
            engine_displacement: 1498,
            fuel_type: FuelType::Petrol,
            declared_value: 15_000.0,
            registration_country: Some("DE".to_string()),
            registration: Some("B-MN 1234".to_string()),
            security_features: Vec::new(),
            modifications: Vec::new(),
        },
        driver: Driver {
            date_of_birth: date(2004, 3, 1),
            license_issue_date: Some(date(2022, 5, 2)),
            licence_type: Some(LicenceType::FullDomestic),
            occupation: Some("Student".to_string()),
            marital_status: None,
            no_claims_years: 0,
            penalty_points: None,
            convictions: Vec::new(),
            claims_history: Vec::new(),
        },
        usage: Usage {
            annual_distance: 12_000,
            primary_use: PrimaryUse::Private,
            parking_location: None,
        },
        location: Location {
            postal_code: "10115".to_string(),
            risk_area: None,
        },
    }
}

pub(crate) fn comprehensive_annual() -> CoverageRequest {
    CoverageRequest {
        cover_level: CoverLevel::Comprehensive,
        payment_frequency: PaymentFrequency::Annual,
        start_date: None,
        excess: None,
    }
}

pub(crate) fn quote_request() -> QuoteRequest {
    QuoteRequest {
        risk: young_driver_profile(),
        coverage: comprehensive_annual(),
    }
}
