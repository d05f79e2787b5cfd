//! SIVI AFS rule set for the Dutch market.

use super::validation::{check_envelope, numeric, truthy, Checker, FieldRule};
use super::{
    NormStandard, NormValidator, Operation, StandardRequest, ValidationCode, ValidationContext,
    ValidationError,
};
use chrono::Datelike;
use serde_json::Value;

/// Statutory minimum third-party cover (WAM), in euro.
pub const MIN_THIRD_PARTY_LIABILITY: f64 = 6_070_000.0;
/// Vehicles older than this need a valid APK inspection.
pub const APK_EXEMPT_YEARS: i32 = 4;
/// Largest premium change a single endorsement may carry, either way.
pub const MAX_PREMIUM_ADJUSTMENT: f64 = 100_000.0;

pub const PAYMENT_FREQUENCIES: &[&str] = &["Jaarlijks", "Kwartaal", "Maandelijks"];
pub const FUEL_TYPES: &[&str] = &["Benzine", "Diesel", "Elektro", "Hybride", "LPG"];
pub const MAIN_USES: &[&str] = &["Prive", "Woon-werk", "Zakelijk"];
pub const PARKING: &[&str] = &["Garage", "Oprit", "Straat"];
pub const LICENCE_TYPES: &[&str] = &["VOLLEDIG", "VOORLOPIG", "INTERNATIONAAL"];
pub const COVERAGE_TYPES: &[&str] = &["WA", "WA_BEPERKT_CASCO", "WA_VOLLEDIG_CASCO"];
pub const CLAIM_TYPES: &[&str] = &[
    "Aanrijding",
    "Diefstal",
    "Vandalisme",
    "Brand",
    "Overstroming",
    "Ruitschade",
    "WA",
    "Casco",
    "Overig",
];
pub const FAULT_STATUSES: &[&str] = &["Schuld", "Geen schuld", "Gedeeld", "Onduidelijk"];
pub const FRAUD_INDICATORS: &[&str] = &[
    "LATE_MELDING",
    "MEERDERE_SCHADES",
    "HOGE_WAARDE",
    "TEGENSTRIJDIG",
    "GEEN_AANGIFTE",
    "VERDACHT_TIJDSTIP",
    "ONGEBRUIKELIJKE_LOCATIE",
    "FRAUDEHISTORIE",
];

const POLICY_RULES: &[FieldRule] = &[
    FieldRule::OneOf("policyHeader.currency", &["EUR"]),
    FieldRule::OneOf("policyHeader.paymentFrequency", PAYMENT_FREQUENCIES),
    FieldRule::Date("policyHeader.startDate"),
    FieldRule::Pattern("policyholder.bsn", r"^[0-9]{9}$", "nine digits"),
    FieldRule::Required("policyholder.address.postalCode"),
    FieldRule::Pattern(
        "policyholder.address.postalCode",
        r"^[0-9]{4}[A-Z]{2}$",
        "a Dutch postal code (1234AB)",
    ),
    FieldRule::Required("vehicle.vehicleDetails.make"),
    FieldRule::Required("vehicle.vehicleDetails.model"),
    FieldRule::Required("vehicle.vehicleDetails.buildYear"),
    FieldRule::Required("vehicle.technical.engineCapacity"),
    FieldRule::Positive("vehicle.technical.engineCapacity"),
    FieldRule::Required("vehicle.technical.fuelType"),
    FieldRule::OneOf("vehicle.technical.fuelType", FUEL_TYPES),
    FieldRule::Required("vehicle.usage.mainUse"),
    FieldRule::OneOf("vehicle.usage.mainUse", MAIN_USES),
    FieldRule::Required("vehicle.usage.annualMileage"),
    FieldRule::Range("vehicle.usage.annualMileage", 0.0, 200_000.0),
    FieldRule::OneOf("vehicle.usage.parkingLocation", PARKING),
    FieldRule::Required("vehicle.valuation.marketValue"),
    FieldRule::Positive("vehicle.valuation.marketValue"),
    FieldRule::MinItems("drivers", 1),
    FieldRule::Required("drivers[].dateOfBirth"),
    FieldRule::Date("drivers[].dateOfBirth"),
    FieldRule::OneOf("drivers[].licenceDetails.licenceType", LICENCE_TYPES),
    FieldRule::Date("drivers[].licenceDetails.issueDate"),
    FieldRule::Required("drivers[].drivingHistory.claimFreeYears"),
    FieldRule::Range("drivers[].drivingHistory.claimFreeYears", 0.0, 50.0),
    FieldRule::Range("drivers[].drivingHistory.penaltyPoints", 0.0, 18.0),
    FieldRule::Required("drivers[].claimsHistory[].date"),
    FieldRule::Date("drivers[].claimsHistory[].date"),
    FieldRule::Required("drivers[].claimsHistory[].claimType"),
    FieldRule::OneOf("drivers[].claimsHistory[].claimType", CLAIM_TYPES),
    FieldRule::Required("drivers[].claimsHistory[].amount"),
    FieldRule::Range("drivers[].claimsHistory[].amount", 0.0, 10_000_000.0),
    FieldRule::Required("drivers[].claimsHistory[].faultStatus"),
    FieldRule::OneOf("drivers[].claimsHistory[].faultStatus", FAULT_STATUSES),
    FieldRule::Required("drivers[].claimsHistory[].settled"),
    FieldRule::Required("coverage.coverageType"),
    FieldRule::OneOf("coverage.coverageType", COVERAGE_TYPES),
    FieldRule::Range("coverage.excess", 0.0, 10_000.0),
    FieldRule::Required("endorsements[].endorsementNumber"),
    FieldRule::Text("endorsements[].endorsementNumber"),
    FieldRule::Required("endorsements[].endorsementType"),
    FieldRule::Text("endorsements[].endorsementType"),
    FieldRule::Date("endorsements[].effectiveDate"),
    FieldRule::Range(
        "endorsements[].premiumAdjustment",
        -MAX_PREMIUM_ADJUSTMENT,
        MAX_PREMIUM_ADJUSTMENT,
    ),
];

const CLAIM_RULES: &[FieldRule] = &[
    FieldRule::Required("claimHeader.claimNumber"),
    FieldRule::Required("claimHeader.claimType"),
    FieldRule::OneOf("claimHeader.claimType", CLAIM_TYPES),
    FieldRule::Date("incident.incidentDate"),
    FieldRule::Pattern("incident.location.country", r"^[A-Z]{2}$", "a two letter country code"),
    FieldRule::Required("vehicle.marketValue"),
    FieldRule::Positive("vehicle.marketValue"),
    FieldRule::Required("liability.faultStatus"),
    FieldRule::OneOf("liability.faultStatus", FAULT_STATUSES),
    FieldRule::OneOf("indicators.fraudIndicators[]", FRAUD_INDICATORS),
];

/// Dutch citizen service number checksum: weights 9..2 on the first eight
/// digits, -1 on the last, sum divisible by 11.
pub fn passes_eleven_test(bsn: &str) -> bool {
    let digits: Vec<i64> = bsn
        .trim()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(i64::from)
        .collect();
    if digits.len() != 9 || bsn.trim().chars().count() != 9 {
        return false;
    }
    let sum: i64 = digits
        .iter()
        .zip([9, 8, 7, 6, 5, 4, 3, 2, -1])
        .map(|(digit, weight)| digit * weight)
        .sum();
    sum != 0 && sum % 11 == 0
}

/// Licence plate without separators: six letters or digits.
pub fn normalised_plate(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

fn is_yes(value: &Value) -> bool {
    truthy(value) == Some(true)
}

pub struct SiviValidator;

impl SiviValidator {
    fn policy_checks(checker: &mut Checker<'_>, context: &ValidationContext) {
        checker.apply(POLICY_RULES);
        checker.model_year("vehicle.vehicleDetails.buildYear", context.today);

        if let Some(bsn) = checker.value("policyholder.bsn").and_then(Value::as_str) {
            if bsn.trim().len() == 9 && !passes_eleven_test(bsn) {
                checker.push(
                    "policyholder.bsn",
                    ValidationCode::InvalidPattern,
                    "policyholder.bsn fails the 11-test",
                );
            }
        }

        if let Some(plate) = checker.value("vehicle.registration.licensePlate").and_then(Value::as_str) {
            let plate = normalised_plate(plate);
            if plate.chars().count() != 6 || !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
                checker.push(
                    "vehicle.registration.licensePlate",
                    ValidationCode::InvalidPattern,
                    "vehicle.registration.licensePlate must be six letters or digits",
                );
            }
        }

        if let Some(limit) = checker.value("coverage.limits.thirdPartyLiability") {
            if numeric(limit).map_or(true, |amount| amount < MIN_THIRD_PARTY_LIABILITY) {
                checker.push(
                    "coverage.limits.thirdPartyLiability",
                    ValidationCode::OutOfRange,
                    format!("third-party liability cover must be at least {MIN_THIRD_PARTY_LIABILITY:.0}"),
                );
            }
        }

        let current_year = f64::from(context.today.year());
        checker.conditional_constraint(
            "vehicle.vehicleDetails.buildYear",
            |year| numeric(year).is_some_and(|year| current_year - year > f64::from(APK_EXEMPT_YEARS)),
            "vehicle.registration.apkValid",
            is_yes,
            "vehicles older than four years need a valid APK",
        );
        checker.conditional_required("hasEndorsements", is_yes, "endorsements");

        let drivers = checker
            .value("drivers")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        for index in 0..drivers {
            checker.driver_age(&format!("drivers[{index}].dateOfBirth"), context.today);
            checker.conditional_constraint(
                &format!("drivers[{index}].licenceDetails.licenceType"),
                |v| v == "VOLLEDIG",
                &format!("drivers[{index}].licenceDetails.issuingCountry"),
                |v| v == "NL",
                "a full licence must be issued in NL",
            );
        }
    }
}

impl NormValidator for SiviValidator {
    fn validate(
        &self,
        request: &StandardRequest,
        version: &str,
        context: &ValidationContext,
    ) -> Vec<ValidationError> {
        let tree = request.data_tree();
        let mut checker = Checker::new(&tree);
        checker.extend(check_envelope(NormStandard::SiviAfs, request, version, context));

        match context.operation {
            Operation::Tariff => Self::policy_checks(&mut checker, context),
            Operation::Reserve => checker.apply(CLAIM_RULES),
            Operation::Transfer => {}
        }
        checker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::{MessageBody, MessageHeader, SiviRequest};
    use crate::testing::date;
    use serde_json::json;

    fn request(data: Value, operation: &str) -> StandardRequest {
        StandardRequest::Sivi(SiviRequest {
            credentials: None,
            body: MessageBody {
                header: MessageHeader {
                    message_id: Some("SIVI-1".to_string()),
                    sender: Some("NL-TUSSENPERSOON".to_string()),
                    norm_version: Some("2024.1".to_string()),
                    ..MessageHeader::default()
                },
                operation: Some(operation.to_string()),
                data,
                metadata: Default::default(),
            },
        })
    }

    fn context(operation: Operation) -> ValidationContext {
        ValidationContext {
            operation,
            today: date(2026, 10, 17),
        }
    }

    fn valid_policy() -> Value {
        json!({
            "policyHeader": { "currency": "EUR", "paymentFrequency": "Maandelijks" },
            "policyholder": { "bsn": "111222333", "address": { "postalCode": "1011AB" } },
            "vehicle": {
                "vehicleDetails": { "make": "Volvo", "model": "V60", "buildYear": 2024 },
                "registration": { "licensePlate": "XK-123-B", "apkValid": false },
                "technical": { "engineCapacity": 1969, "fuelType": "Hybride" },
                "usage": { "mainUse": "Woon-werk", "annualMileage": 15000 },
                "valuation": { "marketValue": 41000 }
            },
            "drivers": [{
                "dateOfBirth": "1979-08-30",
                "licenceDetails": { "licenceType": "VOLLEDIG", "issuingCountry": "NL" },
                "drivingHistory": { "claimFreeYears": 11 }
            }],
            "coverage": { "coverageType": "WA_VOLLEDIG_CASCO", "limits": { "thirdPartyLiability": 6070000 } }
        })
    }

    #[test]
    fn eleven_test_accepts_valid_numbers_only() {
        assert!(passes_eleven_test("111222333"));
        assert!(!passes_eleven_test("123456789"));
        assert!(!passes_eleven_test("000000000"));
        assert!(!passes_eleven_test("11122233"));
    }

    #[test]
    fn a_complete_policy_passes() {
        let errors = SiviValidator.validate(&request(valid_policy(), "offerte"), "2024.1", &context(Operation::Tariff));
        assert_eq!(errors, Vec::new());
    }

    #[test]
    fn dutch_specific_rules_are_enforced() {
        let mut data = valid_policy();
        data["policyholder"]["bsn"] = json!("123456789");
        data["policyholder"]["address"]["postalCode"] = json!("1011 ab");
        data["vehicle"]["vehicleDetails"]["buildYear"] = json!(2015);
        data["coverage"]["limits"]["thirdPartyLiability"] = json!(2500000);
        data["drivers"][0]["licenceDetails"]["issuingCountry"] = json!("BE");
        data["hasEndorsements"] = json!("JA");

        let errors = SiviValidator.validate(&request(data, "offerte"), "2024.1", &context(Operation::Tariff));
        let summary: Vec<(&str, ValidationCode)> = errors
            .iter()
            .map(|e| (e.field_path.as_str(), e.code))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("policyholder.address.postalCode", ValidationCode::InvalidPattern),
                ("policyholder.bsn", ValidationCode::InvalidPattern),
                ("coverage.limits.thirdPartyLiability", ValidationCode::OutOfRange),
                ("vehicle.registration.apkValid", ValidationCode::ConditionalConstraint),
                ("endorsements", ValidationCode::ConditionalRequired),
                ("drivers[0].licenceDetails.issuingCountry", ValidationCode::ConditionalConstraint),
            ]
        );
    }

    #[test]
    fn each_endorsement_is_checked_on_its_own() {
        let mut data = valid_policy();
        data["hasEndorsements"] = json!("JA");
        data["endorsements"] = json!([
            {
                "endorsementNumber": "END-1",
                "endorsementType": "Uitbreiding",
                "effectiveDate": "2026-11-01",
                "premiumAdjustment": -12.5
            },
            {},
            {
                "endorsementNumber": "",
                "endorsementType": 42,
                "effectiveDate": "not-a-date",
                "premiumAdjustment": 250000
            }
        ]);

        let errors = SiviValidator.validate(&request(data, "offerte"), "2024.1", &context(Operation::Tariff));
        let summary: Vec<(&str, ValidationCode)> = errors
            .iter()
            .map(|e| (e.field_path.as_str(), e.code))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("endorsements[1].endorsementNumber", ValidationCode::Required),
                ("endorsements[2].endorsementNumber", ValidationCode::Required),
                ("endorsements[1].endorsementType", ValidationCode::Required),
                ("endorsements[2].endorsementType", ValidationCode::InvalidPattern),
                ("endorsements[2].effectiveDate", ValidationCode::InvalidPattern),
                ("endorsements[2].premiumAdjustment", ValidationCode::OutOfRange),
            ]
        );
    }

    #[test]
    fn a_policy_needs_a_driver() {
        let mut data = valid_policy();
        data["drivers"] = json!([]);
        let errors = SiviValidator.validate(&request(data, "offerte"), "2024.1", &context(Operation::Tariff));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::MinItems);
    }

    #[test]
    fn claims_are_checked_on_the_reserve_endpoint() {
        let data = json!({
            "claimHeader": { "claimNumber": "NL-S-77", "claimType": "Ruitschade" },
            "incident": { "incidentDate": "2026-09-30", "location": { "country": "NL" } },
            "vehicle": { "marketValue": 0 },
            "liability": { "faultStatus": "Geen schuld" }
        });
        let errors = SiviValidator.validate(&request(data, "schade"), "2024.1", &context(Operation::Reserve));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_path, "vehicle.marketValue");
        assert_eq!(errors[0].code, ValidationCode::OutOfRange);
    }

    #[test]
    fn plates_are_compared_without_separators() {
        assert_eq!(normalised_plate(" xk-123-b "), "XK123B");
    }
}
