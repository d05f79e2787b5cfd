//! Well-formed tariff and reserve messages for every standard.
//!
//! Used by the demo command and as baselines in tests: each message passes
//! its standard's validator and rates or reserves without referral.

use crate::codecs::{codec_for, CodecError};
use crate::norms::{MessageBody, MessageHeader, NormStandard, NormFamily, Operation, StandardRequest};
use serde_json::{json, Map, Value};

pub const SAMPLE_SENDER: &str = "DEMO-BROKER";
pub const SAMPLE_TIMESTAMP: &str = "2026-10-17T09:30:00Z";

/// Tariff payload in the standard's own vocabulary.
pub fn tariff_data(standard: NormStandard) -> Value {
    match standard.family() {
        NormFamily::Bipro => json!({
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
        }),
        NormFamily::Sivi => json!({
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
            "coverage": {
                "coverageType": "WA_VOLLEDIG_CASCO",
                "limits": { "thirdPartyLiability": 6070000 }
            }
        }),
        NormFamily::Gdv => json!({
            "address": { "DATE_OF_BIRTH": "1990-06-15", "POSTAL_CODE": "50667", "COUNTRY": "DE" },
            "contract": { "COVERAGE_TYPE": "TK", "PAYMENT_FREQUENCY": "V", "CURRENCY": "EUR" },
            "vehicle": {
                "MAKE": "BMW",
                "MODEL": "320d",
                "MODEL_YEAR": 2021,
                "ENGINE_CC": 1995,
                "FUEL_TYPE": "D",
                "VEHICLE_VALUE": 32500.0,
                "ALARM": "N",
                "IMMOBILISER": "J",
                "TRACKING": "N"
            },
            "usage": { "ANNUAL_MILEAGE": 18000, "MAIN_USE": "W", "NO_CLAIMS_YEARS": 6 }
        }),
    }
}

/// Claim notification payload in the standard's own vocabulary.
pub fn reserve_data(standard: NormStandard) -> Value {
    match standard.family() {
        NormFamily::Bipro => json!({
            "claimData": {
                "claimNumber": "CLM-2026-0042",
                "incidentDate": "2026-09-30",
                "lossType": "KOLLISION",
                "vehicleValue": 15000,
                "faultStatus": "UNGEKLAERT"
            }
        }),
        NormFamily::Sivi => json!({
            "claimHeader": { "claimNumber": "NL-S-77", "claimType": "Ruitschade" },
            "incident": { "incidentDate": "2026-09-30", "location": { "country": "NL" } },
            "vehicle": { "marketValue": 9000 },
            "liability": { "faultStatus": "Geen schuld" }
        }),
        NormFamily::Gdv => json!({
            "claims": [{
                "CLAIM_NUMBER": "S-9",
                "INCIDENT_DATE": "2026-09-30",
                "LOSS_TYPE": "KO",
                "VEHICLE_VALUE": 15000.0,
                "FAULT_STATUS": "U",
                "PARTS_FLAG": "J"
            }]
        }),
    }
}

/// Sample payload for `operation`, or `None` for operations that do not
/// travel through the message pipeline.
pub fn data(standard: NormStandard, operation: Operation) -> Option<Value> {
    match operation {
        Operation::Tariff => Some(tariff_data(standard)),
        Operation::Reserve => Some(reserve_data(standard)),
        Operation::Transfer => None,
    }
}

/// Header a broker would send: current version, fixed id and timestamp.
pub fn header(standard: NormStandard, operation: Operation) -> MessageHeader {
    MessageHeader {
        message_id: Some(format!("{}-{}-0001", standard.id().to_ascii_uppercase(), operation.as_str().to_ascii_uppercase())),
        timestamp: Some(SAMPLE_TIMESTAMP.to_string()),
        sender: Some(SAMPLE_SENDER.to_string()),
        receiver: None,
        norm_version: Some(standard.current_version().to_string()),
    }
}

/// Encodes `data` as an inbound request of `standard`.
pub fn encode(standard: NormStandard, operation: Operation, data: Value) -> Result<Vec<u8>, CodecError> {
    let body = MessageBody {
        header: header(standard, operation),
        operation: Some(operation.as_str().to_string()),
        data,
        metadata: Map::new(),
    };
    let request = StandardRequest::compose(standard, body, None)?;
    codec_for(standard).encode_request(&request)
}

pub fn tariff_message(standard: NormStandard) -> Result<Vec<u8>, CodecError> {
    encode(standard, Operation::Tariff, tariff_data(standard))
}

pub fn reserve_message(standard: NormStandard) -> Result<Vec<u8>, CodecError> {
    encode(standard, Operation::Reserve, reserve_data(standard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::{validator_for, ValidationContext};
    use crate::testing::date;

    #[test]
    fn every_sample_decodes_and_validates() {
        for standard in NormStandard::ALL {
            for (operation, bytes) in [
                (Operation::Tariff, tariff_message(standard)),
                (Operation::Reserve, reserve_message(standard)),
            ] {
                let bytes = bytes.expect("sample encodes");
                let request = codec_for(standard).decode_request(&bytes).expect("sample decodes");
                let context = ValidationContext {
                    operation,
                    today: date(2026, 10, 17),
                };
                let errors = validator_for(standard).validate(&request, standard.current_version(), &context);
                assert!(errors.is_empty(), "{standard} {operation}: {errors:?}");
            }
        }
    }

    #[test]
    fn transfers_have_no_pipeline_sample() {
        assert!(data(NormStandard::Gdv, Operation::Transfer).is_none());
    }
}
