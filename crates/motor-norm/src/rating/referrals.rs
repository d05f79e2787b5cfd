use crate::canonical::{PrimaryUse, Referral, RiskProfile, RiskRating};

const REFERRAL_MIN_AGE: u32 = 21;
const REFERRAL_VEHICLE_VALUE: f64 = 50_000.0;
const REFERRAL_MAX_CLAIMS: usize = 2;
const REFERRAL_MAX_POINTS: u32 = 6;

/// Points-based underwriting grade, independent of the premium arithmetic.
pub(crate) fn risk_rating(profile: &RiskProfile, age: u32, points: u32) -> RiskRating {
    let vehicle = &profile.vehicle;
    let mut score: u32 = 0;

    if vehicle.model_year < 2010 {
        score += 2;
    }
    if vehicle.engine_displacement > 2000 {
        score += 3;
    }
    if vehicle.security_features.is_empty() {
        score += 2;
    }
    if age < 25 {
        score += 5;
    } else if age > 65 {
        score += 2;
    }
    score += points;
    score += 2 * profile.driver.claims_history.len() as u32;
    if profile.usage.annual_distance > 15_000 {
        score += 3;
    }
    if profile.usage.primary_use == PrimaryUse::Business {
        score += 4;
    }

    match score {
        0..=5 => RiskRating::Low,
        6..=15 => RiskRating::Medium,
        _ => RiskRating::High,
    }
}

pub(crate) fn referrals(profile: &RiskProfile, age: u32, points: u32) -> Vec<Referral> {
    let mut referrals = Vec::new();

    if age < REFERRAL_MIN_AGE {
        referrals.push(referral(
            "AGE_YOUNG",
            format!("Driver under {REFERRAL_MIN_AGE} years old"),
            "driver",
        ));
    }
    if profile.vehicle.declared_value > REFERRAL_VEHICLE_VALUE {
        referrals.push(referral(
            "VEHICLE_HIGH_VALUE",
            format!("Vehicle value exceeds {REFERRAL_VEHICLE_VALUE:.0}"),
            "vehicle",
        ));
    }
    if profile.driver.claims_history.len() > REFERRAL_MAX_CLAIMS {
        referrals.push(referral(
            "CLAIMS_MULTIPLE",
            format!("More than {REFERRAL_MAX_CLAIMS} claims in claims history"),
            "claims",
        ));
    }
    if points > REFERRAL_MAX_POINTS {
        referrals.push(referral(
            "LICENCE_HIGH_POINTS",
            format!("More than {REFERRAL_MAX_POINTS} penalty points"),
            "driver",
        ));
    }

    referrals
}

pub(crate) fn referral(code: &str, description: String, category: &str) -> Referral {
    Referral {
        code: code.to_string(),
        description,
        category: category.to_string(),
    }
}
