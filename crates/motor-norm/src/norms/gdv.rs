//! GDV record catalogue, record/tree conversion and the GDV rule set.
//!
//! Payload trees key each record by its layout name and each field by its
//! record field name, e.g. `vehicle.MAKE` or `claims[0].LOSS_TYPE`.

use super::validation::{check_envelope, numeric, parse_date, Checker, FieldRule};
use super::{NormStandard, NormValidator, Operation, StandardRequest, ValidationContext, ValidationError};
use crate::codecs::fixed_width::{
    FieldKind, FieldSpec, FieldValue, FixedRecord, FixedWidthError, RecordLayout, FILLER_FIELD,
    RECORD_TYPE_FIELD,
};
use serde_json::{Map, Number, Value};

const RT: FieldSpec = FieldSpec::alpha(RECORD_TYPE_FIELD, 1, 4);

pub const HEADER_RECORD: RecordLayout = RecordLayout {
    record_type: "0001",
    name: "header",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("MESSAGE_ID", 5, 40),
        FieldSpec::alpha("SENDER", 45, 20),
        FieldSpec::alpha("RECEIVER", 65, 20),
        FieldSpec::alpha("NORM_VERSION", 85, 10),
        FieldSpec::alpha("TIMESTAMP", 95, 14),
        FieldSpec::alpha("OPERATION", 109, 10),
        FieldSpec::alpha("STATUS", 119, 10),
        FieldSpec::alpha(FILLER_FIELD, 129, 128),
    ],
};

pub const ADDRESS_RECORD: RecordLayout = RecordLayout {
    record_type: "0100",
    name: "address",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("SURNAME", 5, 30),
        FieldSpec::alpha("FIRST_NAME", 35, 30),
        FieldSpec::date("DATE_OF_BIRTH", 65),
        FieldSpec::alpha("STREET", 73, 40),
        FieldSpec::alpha("POSTAL_CODE", 113, 5),
        FieldSpec::alpha("CITY", 118, 30),
        FieldSpec::alpha("COUNTRY", 148, 3),
        FieldSpec::alpha(FILLER_FIELD, 151, 106),
    ],
};

pub const CONTRACT_RECORD: RecordLayout = RecordLayout {
    record_type: "0200",
    name: "contract",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("POLICY_NUMBER", 5, 20),
        FieldSpec::date("START_DATE", 25),
        FieldSpec::alpha("COVERAGE_TYPE", 33, 2),
        FieldSpec::alpha("PAYMENT_FREQUENCY", 35, 1),
        FieldSpec::numeric("EXCESS", 36, 7, 2),
        FieldSpec::alpha("CURRENCY", 43, 3),
        FieldSpec::alpha(FILLER_FIELD, 46, 211),
    ],
};

pub const VEHICLE_RECORD: RecordLayout = RecordLayout {
    record_type: "0300",
    name: "vehicle",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("MAKE", 5, 20),
        FieldSpec::alpha("MODEL", 25, 30),
        FieldSpec::numeric("MODEL_YEAR", 55, 4, 0),
        FieldSpec::alpha("VIN", 59, 17),
        FieldSpec::alpha("REGISTRATION", 76, 12),
        FieldSpec::numeric("ENGINE_CC", 88, 5, 0),
        FieldSpec::alpha("FUEL_TYPE", 93, 1),
        FieldSpec::numeric("VEHICLE_VALUE", 94, 9, 2),
        FieldSpec::alpha("ALARM", 103, 1),
        FieldSpec::alpha("IMMOBILISER", 104, 1),
        FieldSpec::alpha("TRACKING", 105, 1),
        FieldSpec::alpha(FILLER_FIELD, 106, 151),
    ],
};

pub const USAGE_RECORD: RecordLayout = RecordLayout {
    record_type: "0310",
    name: "usage",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::date("LICENCE_ISSUE_DATE", 5),
        FieldSpec::alpha("LICENCE_TYPE", 13, 1),
        FieldSpec::alpha("LICENCE_COUNTRY", 14, 3),
        FieldSpec::alpha(FILLER_FIELD, 17, 5),
        FieldSpec::numeric("ANNUAL_MILEAGE", 22, 7, 0),
        FieldSpec::alpha("MAIN_USE", 29, 1),
        FieldSpec::alpha("PARKING", 30, 1),
        FieldSpec::numeric("NO_CLAIMS_YEARS", 31, 2, 0),
        FieldSpec::numeric("PENALTY_POINTS", 33, 2, 0),
        FieldSpec::alpha(FILLER_FIELD, 35, 222),
    ],
};

pub const CLAIM_RECORD: RecordLayout = RecordLayout {
    record_type: "0400",
    name: "claims",
    repeatable: true,
    fields: &[
        RT,
        FieldSpec::alpha("CLAIM_NUMBER", 5, 20),
        FieldSpec::alpha("POLICY_NUMBER", 25, 20),
        FieldSpec::date("INCIDENT_DATE", 45),
        FieldSpec::alpha("LOSS_TYPE", 53, 2),
        FieldSpec::numeric("CLAIM_AMOUNT", 55, 11, 2),
        FieldSpec::numeric("VEHICLE_VALUE", 66, 9, 2),
        FieldSpec::alpha("FAULT_STATUS", 75, 1),
        FieldSpec::alpha("SETTLED", 76, 1),
        FieldSpec::alpha(FILLER_FIELD, 77, 8),
        FieldSpec::alpha("FRAUD_FLAG", 85, 1),
        FieldSpec::alpha("PARTS_FLAG", 86, 1),
        FieldSpec::alpha(FILLER_FIELD, 87, 170),
    ],
};

pub const QUOTE_RECORD: RecordLayout = RecordLayout {
    record_type: "0500",
    name: "quote",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("STATUS", 5, 10),
        FieldSpec::numeric("NET_PREMIUM", 15, 11, 2),
        FieldSpec::numeric("TAX_AMOUNT", 26, 11, 2),
        FieldSpec::numeric("TOTAL_PREMIUM", 37, 11, 2),
        FieldSpec::numeric("INSTALMENT", 48, 11, 2),
        FieldSpec::alpha("CURRENCY", 59, 3),
        FieldSpec::date("VALID_FROM", 62),
        FieldSpec::date("VALID_TO", 70),
        FieldSpec::alpha("RISK_RATING", 78, 6),
        FieldSpec::alpha("PAYMENT_FREQUENCY", 84, 1),
        FieldSpec::alpha(FILLER_FIELD, 85, 172),
    ],
};

pub const RESERVE_RECORD: RecordLayout = RecordLayout {
    record_type: "0600",
    name: "reserve",
    repeatable: false,
    fields: &[
        RT,
        FieldSpec::alpha("CLAIM_NUMBER", 5, 20),
        FieldSpec::alpha("LOSS_TYPE", 25, 2),
        FieldSpec::numeric("BASE_AMOUNT", 27, 11, 2),
        FieldSpec::numeric("FRAUD_LOAD", 38, 11, 2),
        FieldSpec::numeric("LIABILITY_LOAD", 49, 11, 2),
        FieldSpec::numeric("PARTS_LOAD", 60, 11, 2),
        FieldSpec::numeric("FINAL_AMOUNT", 71, 11, 2),
        FieldSpec::alpha("BAND", 82, 10),
        FieldSpec::alpha("FRAUD_LEVEL", 92, 8),
        FieldSpec::alpha(FILLER_FIELD, 100, 157),
    ],
};

pub const ERROR_RECORD: RecordLayout = RecordLayout {
    record_type: "9950",
    name: "errors",
    repeatable: true,
    fields: &[
        RT,
        FieldSpec::alpha("CODE", 5, 24),
        FieldSpec::alpha("FIELD", 29, 60),
        FieldSpec::alpha("SEVERITY", 89, 10),
        FieldSpec::alpha("MESSAGE", 99, 158),
    ],
};

pub static CATALOGUE: &[RecordLayout] = &[
    HEADER_RECORD,
    ADDRESS_RECORD,
    CONTRACT_RECORD,
    VEHICLE_RECORD,
    USAGE_RECORD,
    CLAIM_RECORD,
    QUOTE_RECORD,
    RESERVE_RECORD,
    ERROR_RECORD,
];

pub fn layout(record_type: &str) -> Option<&'static RecordLayout> {
    CATALOGUE.iter().find(|layout| layout.record_type == record_type)
}

fn is_data_layout(layout: &RecordLayout) -> bool {
    layout.record_type != HEADER_RECORD.record_type && layout.record_type != ERROR_RECORD.record_type
}

fn field_to_json(spec: &FieldSpec, value: &FieldValue) -> Value {
    match (spec.kind, value) {
        (FieldKind::Numeric { decimals: 0 }, FieldValue::Number(number)) => Value::from(*number),
        (FieldKind::Numeric { decimals }, FieldValue::Number(number)) => {
            let scaled = *number as f64 / 10f64.powi(i32::from(decimals));
            Number::from_f64(scaled).map_or(Value::Null, Value::Number)
        }
        (_, FieldValue::Date(date)) => Value::String(date.format("%Y-%m-%d").to_string()),
        (_, FieldValue::Text(text)) => Value::String(text.clone()),
        (FieldKind::Alpha | FieldKind::Date, FieldValue::Number(number)) => Value::from(*number),
    }
}

fn record_to_json(layout: &RecordLayout, record: &FixedRecord) -> Value {
    let mut object = Map::new();
    for (name, value) in &record.fields {
        if let Some(spec) = layout.field(name) {
            object.insert(name.clone(), field_to_json(spec, value));
        }
    }
    Value::Object(object)
}

/// Data records keyed by layout name. Repeatable records become lists in
/// the order they were read.
pub fn records_to_tree(records: &[FixedRecord]) -> Value {
    let mut tree = Map::new();
    for record in records {
        let Some(layout) = layout(&record.record_type) else {
            continue;
        };
        let object = record_to_json(layout, record);
        if layout.repeatable {
            let entry = tree
                .entry(layout.name.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(object);
            }
        } else {
            tree.insert(layout.name.to_string(), object);
        }
    }
    Value::Object(tree)
}

fn json_to_field(spec: &FieldSpec, value: &Value) -> Result<Option<FieldValue>, FixedWidthError> {
    if value.is_null() {
        return Ok(None);
    }
    let invalid_number = || FixedWidthError::InvalidNumber {
        field: spec.name.to_string(),
        raw: value.to_string(),
    };
    match spec.kind {
        FieldKind::Alpha => Ok(Some(FieldValue::Text(match value {
            Value::String(text) => text.clone(),
            Value::Bool(true) => "J".to_string(),
            Value::Bool(false) => "N".to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                return Err(FixedWidthError::KindMismatch {
                    field: spec.name,
                    expected: "alphanumeric",
                })
            }
        }))),
        FieldKind::Numeric { decimals } => {
            let amount = numeric(value).ok_or_else(invalid_number)?;
            let minor = (amount * 10f64.powi(i32::from(decimals))).round();
            if !minor.is_finite() || minor < 0.0 || minor > u64::MAX as f64 {
                return Err(invalid_number());
            }
            Ok(Some(FieldValue::Number(minor as u64)))
        }
        FieldKind::Date => value
            .as_str()
            .and_then(parse_date)
            .map(|date| Some(FieldValue::Date(date)))
            .ok_or_else(|| FixedWidthError::InvalidDate {
                field: spec.name.to_string(),
                raw: value.to_string(),
            }),
    }
}

fn object_to_record(layout: &RecordLayout, value: &Value) -> Result<FixedRecord, FixedWidthError> {
    let Value::Object(object) = value else {
        return Err(FixedWidthError::KindMismatch {
            field: layout.name,
            expected: "record",
        });
    };
    let mut record = FixedRecord::new(layout.record_type);
    for (name, value) in object {
        let spec = layout.field(name).ok_or_else(|| FixedWidthError::UnknownField {
            record: layout.record_type,
            field: name.clone(),
        })?;
        if let Some(field) = json_to_field(spec, value)? {
            record.set(name.clone(), field);
        }
    }
    Ok(record)
}

/// Inverse of [`records_to_tree`]. Records come out in catalogue order.
pub fn tree_to_records(tree: &Value) -> Result<Vec<FixedRecord>, FixedWidthError> {
    let Value::Object(object) = tree else {
        return Err(FixedWidthError::KindMismatch {
            field: "data",
            expected: "record",
        });
    };
    if let Some(unknown) = object
        .keys()
        .find(|key| !CATALOGUE.iter().any(|layout| is_data_layout(layout) && layout.name == *key))
    {
        return Err(FixedWidthError::UnknownRecordType(unknown.clone()));
    }

    let mut records = Vec::new();
    for layout in CATALOGUE.iter().filter(|layout| is_data_layout(layout)) {
        match (object.get(layout.name), layout.repeatable) {
            (None | Some(Value::Null), _) => {}
            (Some(Value::Array(items)), true) => {
                for item in items {
                    records.push(object_to_record(layout, item)?);
                }
            }
            (Some(value), _) => records.push(object_to_record(layout, value)?),
        }
    }
    Ok(records)
}

const TARIFF_RULES: &[FieldRule] = &[
    FieldRule::Required("address.DATE_OF_BIRTH"),
    FieldRule::Required("address.POSTAL_CODE"),
    FieldRule::Pattern("address.POSTAL_CODE", r"^[0-9]{5}$", "a five digit postal code"),
    FieldRule::Required("contract.COVERAGE_TYPE"),
    FieldRule::OneOf("contract.COVERAGE_TYPE", &["HP", "TK", "VK"]),
    FieldRule::OneOf("contract.PAYMENT_FREQUENCY", &["J", "V", "M"]),
    FieldRule::OneOf("contract.CURRENCY", &["EUR"]),
    FieldRule::Required("vehicle.MAKE"),
    FieldRule::Required("vehicle.MODEL"),
    FieldRule::Required("vehicle.MODEL_YEAR"),
    FieldRule::Required("vehicle.ENGINE_CC"),
    FieldRule::Required("vehicle.FUEL_TYPE"),
    FieldRule::OneOf("vehicle.FUEL_TYPE", &["B", "D", "E", "H", "G"]),
    FieldRule::Required("vehicle.VEHICLE_VALUE"),
    FieldRule::Positive("vehicle.VEHICLE_VALUE"),
    FieldRule::OneOf("vehicle.ALARM", &["J", "N"]),
    FieldRule::OneOf("vehicle.IMMOBILISER", &["J", "N"]),
    FieldRule::OneOf("vehicle.TRACKING", &["J", "N"]),
    FieldRule::OneOf("usage.LICENCE_TYPE", &["F", "P", "I"]),
    FieldRule::Required("usage.ANNUAL_MILEAGE"),
    FieldRule::Required("usage.MAIN_USE"),
    FieldRule::OneOf("usage.MAIN_USE", &["P", "W", "G"]),
    FieldRule::OneOf("usage.PARKING", &["G", "S", "T"]),
    FieldRule::Required("usage.NO_CLAIMS_YEARS"),
    FieldRule::Range("usage.NO_CLAIMS_YEARS", 0.0, 50.0),
    FieldRule::Range("usage.PENALTY_POINTS", 0.0, 18.0),
    FieldRule::Required("claims[].INCIDENT_DATE"),
    FieldRule::Required("claims[].LOSS_TYPE"),
    FieldRule::OneOf("claims[].LOSS_TYPE", LOSS_TYPES),
    FieldRule::Required("claims[].CLAIM_AMOUNT"),
    FieldRule::Required("claims[].FAULT_STATUS"),
    FieldRule::OneOf("claims[].FAULT_STATUS", FAULT_STATUSES),
    FieldRule::Required("claims[].SETTLED"),
    FieldRule::OneOf("claims[].SETTLED", &["J", "N"]),
];

const RESERVE_RULES: &[FieldRule] = &[
    FieldRule::MinItems("claims", 1),
    FieldRule::Required("claims[].CLAIM_NUMBER"),
    FieldRule::Required("claims[].LOSS_TYPE"),
    FieldRule::OneOf("claims[].LOSS_TYPE", LOSS_TYPES),
    FieldRule::Required("claims[].VEHICLE_VALUE"),
    FieldRule::Positive("claims[].VEHICLE_VALUE"),
    FieldRule::Required("claims[].FAULT_STATUS"),
    FieldRule::OneOf("claims[].FAULT_STATUS", FAULT_STATUSES),
    FieldRule::OneOf("claims[].FRAUD_FLAG", &["J", "N"]),
    FieldRule::OneOf("claims[].PARTS_FLAG", &["J", "N"]),
];

pub const LOSS_TYPES: &[&str] = &["KO", "DI", "VA", "FE", "UE", "GL", "HP", "VK", "SO"];
pub const FAULT_STATUSES: &[&str] = &["A", "N", "T", "U"];

pub struct GdvValidator;

impl NormValidator for GdvValidator {
    fn validate(
        &self,
        request: &StandardRequest,
        version: &str,
        context: &ValidationContext,
    ) -> Vec<ValidationError> {
        let tree = request.data_tree();
        let mut checker = Checker::new(&tree);
        checker.extend(check_envelope(NormStandard::Gdv, request, version, context));

        match context.operation {
            Operation::Tariff => {
                checker.apply(TARIFF_RULES);
                checker.model_year("vehicle.MODEL_YEAR", context.today);
                checker.driver_age("address.DATE_OF_BIRTH", context.today);
                checker.conditional_constraint(
                    "usage.LICENCE_TYPE",
                    |v| v == "F",
                    "usage.LICENCE_COUNTRY",
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
    use crate::codecs::fixed_width::encode_record;
    use crate::norms::{LegacyRequest, MessageHeader, ValidationCode};
    use crate::testing::date;
    use serde_json::json;

    fn legacy(records: Vec<FixedRecord>) -> StandardRequest {
        StandardRequest::Legacy(LegacyRequest {
            header: MessageHeader {
                message_id: Some("GDV-1".to_string()),
                sender: Some("VU-4711".to_string()),
                norm_version: Some("2018".to_string()),
                ..MessageHeader::default()
            },
            operation: Some("tariff".to_string()),
            records,
        })
    }

    fn context(operation: Operation) -> ValidationContext {
        ValidationContext {
            operation,
            today: date(2026, 10, 17),
        }
    }

    #[test]
    fn every_layout_covers_the_record() {
        for layout in CATALOGUE {
            layout.verify().expect("layout is contiguous");
        }
    }

    #[test]
    fn trees_round_trip_through_records() {
        let tree = json!({
            "vehicle": { "MAKE": "BMW", "MODEL_YEAR": 2021, "VEHICLE_VALUE": 32500.5 },
            "claims": [
                { "CLAIM_NUMBER": "S-1", "INCIDENT_DATE": "2025-02-03" },
                { "CLAIM_NUMBER": "S-2", "CLAIM_AMOUNT": 1200.0 }
            ]
        });
        let records = tree_to_records(&tree).expect("converts");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].record_type, "0300");
        assert_eq!(records[1].get("INCIDENT_DATE"), Some(&FieldValue::Date(date(2025, 2, 3))));
        assert_eq!(records_to_tree(&records), tree);
    }

    #[test]
    fn flags_and_numeric_strings_are_accepted_on_the_way_out() {
        let tree = json!({ "vehicle": { "ALARM": true, "ENGINE_CC": "1598" } });
        let records = tree_to_records(&tree).expect("converts");
        assert_eq!(records[0].text("ALARM"), Some("J"));
        assert_eq!(records[0].get("ENGINE_CC"), Some(&FieldValue::Number(1598)));
        let line = encode_record(&VEHICLE_RECORD, &records[0]).expect("encodes");
        assert_eq!(&line[87..92], "01598");
    }

    #[test]
    fn unknown_records_and_fields_are_rejected() {
        assert!(matches!(
            tree_to_records(&json!({ "trailer": {} })),
            Err(FixedWidthError::UnknownRecordType(name)) if name == "trailer"
        ));
        assert!(matches!(
            tree_to_records(&json!({ "vehicle": { "COLOUR": "red" } })),
            Err(FixedWidthError::UnknownField { .. })
        ));
        assert!(tree_to_records(&json!({ "quote": { "NET_PREMIUM": -5 } })).is_err());
    }

    #[test]
    fn missing_tariff_records_are_reported_per_field() {
        let errors = GdvValidator.validate(&legacy(Vec::new()), "2018", &context(Operation::Tariff));
        assert!(errors.iter().all(|e| e.code == ValidationCode::Required));
        let paths: Vec<&str> = errors.iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "address.DATE_OF_BIRTH",
                "address.POSTAL_CODE",
                "contract.COVERAGE_TYPE",
                "vehicle.MAKE",
                "vehicle.MODEL",
                "vehicle.MODEL_YEAR",
                "vehicle.ENGINE_CC",
                "vehicle.FUEL_TYPE",
                "vehicle.VEHICLE_VALUE",
                "usage.ANNUAL_MILEAGE",
                "usage.MAIN_USE",
                "usage.NO_CLAIMS_YEARS",
            ]
        );
    }

    #[test]
    fn full_licences_must_be_german() {
        let usage = FixedRecord::new("0310")
            .with("LICENCE_TYPE", FieldValue::Text("F".to_string()))
            .with("LICENCE_COUNTRY", FieldValue::Text("AT".to_string()));
        let errors = GdvValidator.validate(&legacy(vec![usage]), "2018", &context(Operation::Tariff));
        assert!(errors.iter().any(|e| e.code == ValidationCode::ConditionalConstraint
            && e.field_path == "usage.LICENCE_COUNTRY"));
    }

    #[test]
    fn reserve_needs_a_claim_record() {
        let mut request = legacy(Vec::new());
        if let StandardRequest::Legacy(legacy) = &mut request {
            legacy.operation = Some("reserve".to_string());
        }
        let errors = GdvValidator.validate(&request, "2018", &context(Operation::Reserve));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::MinItems);
        assert_eq!(errors[0].field_path, "claims");
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        let errors = GdvValidator.validate(&legacy(Vec::new()), "2013", &context(Operation::Transfer));
        let version: Vec<_> = errors
            .iter()
            .filter(|e| e.field_path == "messageHeader.normVersion")
            .collect();
        assert_eq!(version.len(), 1);
        assert_eq!(version[0].code, ValidationCode::InvalidEnum);
    }
}
