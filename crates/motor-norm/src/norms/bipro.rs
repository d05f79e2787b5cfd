//! BiPRO rule set, shared by RClassic and RNext.

use super::validation::{check_envelope, truthy, Checker, FieldRule};
use super::{NormValidator, Operation, StandardRequest, ValidationContext, ValidationError};
use serde_json::Value;

pub const FUEL_TYPES: &[&str] = &["BENZIN", "DIESEL", "ELEKTRO", "HYBRID", "GAS"];
pub const SECURITY_FEATURES: &[&str] = &["ALARMANLAGE", "WEGFAHRSPERRE", "ORTUNG"];
pub const LICENCE_TYPES: &[&str] = &["FULL", "PROVISIONAL", "INTERNATIONAL"];
pub const MARITAL_STATUSES: &[&str] = &["LEDIG", "VERHEIRATET", "PARTNERSCHAFT", "GESCHIEDEN", "VERWITWET"];
pub const MAIN_USES: &[&str] = &["PRIVAT", "PENDEL", "GESCHAEFTLICH"];
pub const PARKING: &[&str] = &["GARAGE", "STELLPLATZ", "STRASSE"];
pub const RISK_AREAS: &[&str] = &["STANDARD", "HOCH"];
pub const COVERAGE_TYPES: &[&str] = &["HAFTPFLICHT", "TEILKASKO", "VOLLKASKO"];
pub const PAYMENT_FREQUENCIES: &[&str] = &["JAEHRLICH", "VIERTELJAEHRLICH", "MONATLICH"];
pub const LOSS_TYPES: &[&str] = &[
    "KOLLISION",
    "DIEBSTAHL",
    "VANDALISMUS",
    "FEUER",
    "UEBERSCHWEMMUNG",
    "GLAS",
    "HAFTPFLICHT",
    "VOLLKASKO",
    "SONSTIGE",
];
pub const FAULT_STATUSES: &[&str] = &["SCHULD", "KEINE_SCHULD", "TEILSCHULD", "UNGEKLAERT"];
pub const FRAUD_INDICATORS: &[&str] = &[
    "SPAETE_MELDUNG",
    "MEHRFACHSCHADEN",
    "HOHER_WERT",
    "WIDERSPRUECHLICH",
    "KEINE_ANZEIGE",
    "VERDAECHTIGER_ZEITPUNKT",
    "UNGEWOEHNLICHER_ORT",
    "BETRUGSHISTORIE",
];

const TARIFF_RULES: &[FieldRule] = &[
    FieldRule::Required("riskData.vehicleData.make"),
    FieldRule::Required("riskData.vehicleData.model"),
    FieldRule::Required("riskData.vehicleData.year"),
    FieldRule::Required("riskData.vehicleData.engineSize"),
    FieldRule::Positive("riskData.vehicleData.engineSize"),
    FieldRule::Required("riskData.vehicleData.fuelType"),
    FieldRule::OneOf("riskData.vehicleData.fuelType", FUEL_TYPES),
    FieldRule::Required("riskData.vehicleData.vehicleValue"),
    FieldRule::Positive("riskData.vehicleData.vehicleValue"),
    FieldRule::Pattern("riskData.vehicleData.vin", r"^[A-HJ-NPR-Z0-9]{17}$", "a 17 character VIN"),
    FieldRule::OneOf("riskData.vehicleData.securityFeatures[]", SECURITY_FEATURES),
    FieldRule::Required("riskData.driverData.dateOfBirth"),
    FieldRule::Date("riskData.driverData.dateOfBirth"),
    FieldRule::Date("riskData.driverData.licenseIssueDate"),
    FieldRule::OneOf("riskData.driverData.licenseType", LICENCE_TYPES),
    FieldRule::OneOf("riskData.driverData.maritalStatus", MARITAL_STATUSES),
    FieldRule::Required("riskData.driverData.noClaimsYears"),
    FieldRule::Range("riskData.driverData.noClaimsYears", 0.0, 50.0),
    FieldRule::Required("riskData.driverData.convictions[].date"),
    FieldRule::Date("riskData.driverData.convictions[].date"),
    FieldRule::Required("riskData.driverData.convictions[].type"),
    FieldRule::Required("riskData.driverData.convictions[].points"),
    FieldRule::Range("riskData.driverData.convictions[].points", 0.0, 18.0),
    FieldRule::Range("riskData.driverData.convictions[].fine", 0.0, 1_000_000.0),
    FieldRule::Required("riskData.driverData.claimsHistory[].date"),
    FieldRule::Date("riskData.driverData.claimsHistory[].date"),
    FieldRule::Required("riskData.driverData.claimsHistory[].type"),
    FieldRule::OneOf("riskData.driverData.claimsHistory[].type", LOSS_TYPES),
    FieldRule::Required("riskData.driverData.claimsHistory[].amount"),
    FieldRule::Range("riskData.driverData.claimsHistory[].amount", 0.0, 10_000_000.0),
    FieldRule::Required("riskData.driverData.claimsHistory[].faultStatus"),
    FieldRule::OneOf("riskData.driverData.claimsHistory[].faultStatus", FAULT_STATUSES),
    FieldRule::Required("riskData.driverData.claimsHistory[].settled"),
    FieldRule::Required("riskData.usageData.annualMileage"),
    FieldRule::Range("riskData.usageData.annualMileage", 0.0, 200_000.0),
    FieldRule::Required("riskData.usageData.mainUse"),
    FieldRule::OneOf("riskData.usageData.mainUse", MAIN_USES),
    FieldRule::OneOf("riskData.usageData.overnightParking", PARKING),
    FieldRule::Required("riskData.locationData.postalCode"),
    FieldRule::Pattern("riskData.locationData.postalCode", r"^[0-9]{5}$", "a five digit postal code"),
    FieldRule::OneOf("riskData.locationData.riskArea", RISK_AREAS),
    FieldRule::Required("coverageData.coverageType"),
    FieldRule::OneOf("coverageData.coverageType", COVERAGE_TYPES),
    FieldRule::OneOf("coverageData.paymentFrequency", PAYMENT_FREQUENCIES),
    FieldRule::Range("coverageData.excess", 0.0, 10_000.0),
    FieldRule::Date("coverageData.startDate"),
];

const RESERVE_RULES: &[FieldRule] = &[
    FieldRule::Required("claimData.claimNumber"),
    FieldRule::MinLength("claimData.claimNumber", 3),
    FieldRule::Date("claimData.incidentDate"),
    FieldRule::Required("claimData.lossType"),
    FieldRule::OneOf("claimData.lossType", LOSS_TYPES),
    FieldRule::Required("claimData.vehicleValue"),
    FieldRule::Positive("claimData.vehicleValue"),
    FieldRule::Required("claimData.faultStatus"),
    FieldRule::OneOf("claimData.faultStatus", FAULT_STATUSES),
    FieldRule::OneOf("claimData.fraudIndicators[]", FRAUD_INDICATORS),
];

fn is_yes(value: &Value) -> bool {
    truthy(value) == Some(true)
}

pub struct BiproValidator;

impl NormValidator for BiproValidator {
    fn validate(
        &self,
        request: &StandardRequest,
        version: &str,
        context: &ValidationContext,
    ) -> Vec<ValidationError> {
        let tree = request.data_tree();
        let mut checker = Checker::new(&tree);
        checker.extend(check_envelope(request.standard(), request, version, context));

        match context.operation {
            Operation::Tariff => {
                checker.apply(TARIFF_RULES);
                checker.model_year("riskData.vehicleData.year", context.today);
                checker.driver_age("riskData.driverData.dateOfBirth", context.today);
                checker.conditional_required(
                    "riskData.driverData.hasConvictions",
                    is_yes,
                    "riskData.driverData.convictions",
                );
                checker.conditional_required(
                    "riskData.driverData.hasClaims",
                    is_yes,
                    "riskData.driverData.claimsHistory",
                );
                checker.conditional_constraint(
                    "riskData.driverData.licenseType",
                    |v| v == "FULL",
                    "riskData.driverData.licenseCountry",
                    |v| v == "DE",
                    "a full licence must be issued in DE",
                );
            }
            Operation::Reserve => checker.apply(RESERVE_RULES),
            Operation::Transfer => {}
        }
        checker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::{BiproFlavour, BiproRequest, MessageBody, MessageHeader, ValidationCode};
    use crate::testing::date;
    use serde_json::json;

    fn request(data: Value, operation: &str) -> StandardRequest {
        StandardRequest::Bipro(BiproRequest {
            flavour: BiproFlavour::RClassic,
            credentials: None,
            body: MessageBody {
                header: MessageHeader {
                    message_id: Some("BIPRO-1".to_string()),
                    sender: Some("MAKLER-1".to_string()),
                    norm_version: Some("2024.1".to_string()),
                    ..MessageHeader::default()
                },
                operation: Some(operation.to_string()),
                data,
                metadata: Default::default(),
            },
        })
    }

    fn tariff_context() -> ValidationContext {
        ValidationContext {
            operation: Operation::Tariff,
            today: date(2026, 10, 17),
        }
    }

    fn valid_tariff() -> Value {
        json!({
            "riskData": {
                "vehicleData": {
                    "make": "Volkswagen",
                    "model": "Golf",
                    "year": 2020,
                    "engineSize": 1.5,
                    "fuelType": "BENZIN",
                    "vehicleValue": 22000,
                    "securityFeatures": ["ALARMANLAGE"]
                },
                "driverData": {
                    "dateOfBirth": "1985-04-12",
                    "licenseType": "FULL",
                    "licenseCountry": "DE",
                    "noClaimsYears": 8,
                    "hasConvictions": false
                },
                "usageData": { "annualMileage": 12000, "mainUse": "PRIVAT" },
                "locationData": { "postalCode": "80331" }
            },
            "coverageData": { "coverageType": "VOLLKASKO", "paymentFrequency": "MONATLICH" }
        })
    }

    #[test]
    fn a_complete_tariff_request_passes() {
        let errors = BiproValidator.validate(&request(valid_tariff(), "tariff"), "2024.1", &tariff_context());
        assert_eq!(errors, Vec::new());
    }

    #[test]
    fn three_missing_fields_give_three_required_errors() {
        let mut data = valid_tariff();
        let vehicle = &mut data["riskData"]["vehicleData"];
        vehicle["make"] = Value::Null;
        vehicle["fuelType"] = json!("");
        data["riskData"]["locationData"] = json!({});

        let errors = BiproValidator.validate(&request(data, "tariff"), "2024.1", &tariff_context());
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.code == ValidationCode::Required));
    }

    #[test]
    fn convictions_are_required_once_declared() {
        let mut data = valid_tariff();
        data["riskData"]["driverData"]["hasConvictions"] = json!(true);
        data["riskData"]["driverData"]["convictions"] = json!([]);
        let errors = BiproValidator.validate(&request(data, "tariff"), "2024.1", &tariff_context());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::ConditionalRequired);
        assert_eq!(errors[0].field_path, "riskData.driverData.convictions");
    }

    #[test]
    fn list_items_are_checked_with_their_index() {
        let mut data = valid_tariff();
        data["riskData"]["driverData"]["hasClaims"] = json!(true);
        data["riskData"]["driverData"]["claimsHistory"] = json!([
            { "date": "2024-01-10", "type": "GLAS", "amount": 400, "faultStatus": "KEINE_SCHULD", "settled": true },
            { "date": "2025-03-02", "type": "METEOR", "amount": 900, "faultStatus": "SCHULD", "settled": false }
        ]);
        let errors = BiproValidator.validate(&request(data, "tariff"), "2024.1", &tariff_context());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_path, "riskData.driverData.claimsHistory[1].type");
        assert_eq!(errors[0].code, ValidationCode::InvalidEnum);
    }

    #[test]
    fn ranges_follow_the_evaluation_date() {
        let mut data = valid_tariff();
        data["riskData"]["vehicleData"]["year"] = json!(2028);
        data["riskData"]["driverData"]["dateOfBirth"] = json!("2011-01-01");
        data["riskData"]["driverData"]["licenseCountry"] = json!("AT");
        let errors = BiproValidator.validate(&request(data, "tariff"), "2024.1", &tariff_context());
        let codes: Vec<(&str, ValidationCode)> = errors
            .iter()
            .map(|e| (e.field_path.as_str(), e.code))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("riskData.vehicleData.year", ValidationCode::OutOfRange),
                ("riskData.driverData.dateOfBirth", ValidationCode::OutOfRange),
                ("riskData.driverData.licenseCountry", ValidationCode::ConditionalConstraint),
            ]
        );
    }

    #[test]
    fn reserve_rules_apply_on_the_reserve_endpoint() {
        let data = json!({
            "claimData": {
                "claimNumber": "SCH-2026-001",
                "lossType": "KOLLISION",
                "vehicleValue": 15000,
                "faultStatus": "UNKLAR",
                "fraudIndicators": ["SPAETE_MELDUNG"]
            }
        });
        let context = ValidationContext {
            operation: Operation::Reserve,
            today: date(2026, 10, 17),
        };
        let errors = BiproValidator.validate(&request(data, "reserve"), "2023.2", &context);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_path, "claimData.faultStatus");
    }

    #[test]
    fn operation_must_match_the_endpoint() {
        let errors = BiproValidator.validate(&request(valid_tariff(), "reserve"), "2024.1", &tariff_context());
        assert!(errors
            .iter()
            .any(|e| e.field_path == "operation" && e.code == ValidationCode::InvalidEnum));
    }
}
