//! Value conversions applied while copying a field between trees.

use super::{Direction, MappingError};
use crate::norms::validation::{numeric, parse_date, truthy};
use crate::path::FieldPath;
use serde_json::{Number, Value};

/// `(wire code, canonical code)` pairs.
pub type CodeTable = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Identity,
    /// Code list translation.
    Codes(CodeTable),
    /// Canonical value = wire value × factor, rounded to an integer.
    Scale(f64),
    Integer,
    Decimal,
    /// Boolean or a yes/no code on the wire, boolean in the canonical tree.
    YesNo,
    /// Any accepted date notation in, ISO `YYYY-MM-DD` out.
    Date,
}

impl Transform {
    pub fn name(self) -> &'static str {
        match self {
            Transform::Identity => "identity",
            Transform::Codes(_) => "code-list",
            Transform::Scale(_) => "scale",
            Transform::Integer => "integer",
            Transform::Decimal => "decimal",
            Transform::YesNo => "yes-no",
            Transform::Date => "date",
        }
    }

    pub(crate) fn apply(
        self,
        direction: Direction,
        value: &Value,
        at: &FieldPath,
    ) -> Result<Value, MappingError> {
        match self {
            Transform::Identity => Ok(value.clone()),
            Transform::Codes(table) => translate(table, direction, value, at),
            Transform::Scale(factor) => {
                let amount = number(value, at)?;
                match direction {
                    Direction::ToCanonical => whole(amount * factor, at),
                    Direction::ToWire => decimal(amount / factor, at),
                }
            }
            Transform::Integer => {
                let amount = number(value, at)?;
                if amount.fract() != 0.0 {
                    return Err(invalid(at, format!("expected a whole number, found {amount}")));
                }
                whole(amount, at)
            }
            Transform::Decimal => decimal(number(value, at)?, at),
            Transform::YesNo => truthy(value)
                .map(Value::Bool)
                .ok_or_else(|| invalid(at, format!("expected a yes/no value, found {value}"))),
            Transform::Date => value
                .as_str()
                .and_then(parse_date)
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| invalid(at, format!("expected a date, found {value}"))),
        }
    }
}

fn invalid(at: &FieldPath, reason: String) -> MappingError {
    MappingError::InvalidValue {
        path: at.to_string(),
        reason,
    }
}

fn number(value: &Value, at: &FieldPath) -> Result<f64, MappingError> {
    numeric(value)
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| invalid(at, format!("expected a number, found {value}")))
}

fn whole(amount: f64, at: &FieldPath) -> Result<Value, MappingError> {
    let rounded = amount.round();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return Err(invalid(at, format!("{amount} is out of range")));
    }
    Ok(Value::from(rounded as i64))
}

fn decimal(amount: f64, at: &FieldPath) -> Result<Value, MappingError> {
    Number::from_f64(amount)
        .map(Value::Number)
        .ok_or_else(|| invalid(at, format!("{amount} is not representable")))
}

fn translate(
    table: CodeTable,
    direction: Direction,
    value: &Value,
    at: &FieldPath,
) -> Result<Value, MappingError> {
    let code = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        other => return Err(invalid(at, format!("expected a code, found {other}"))),
    };
    let found = table.iter().find_map(|(wire, canonical)| match direction {
        Direction::ToCanonical => (*wire == code).then_some(*canonical),
        Direction::ToWire => (*canonical == code).then_some(*wire),
    });
    found
        .map(|code| Value::String(code.to_string()))
        .ok_or(MappingError::UnknownCode {
            path: at.to_string(),
            code,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FUEL: CodeTable = &[("BENZIN", "petrol"), ("DIESEL", "diesel")];

    fn at() -> FieldPath {
        FieldPath::parse("vehicle.fuel")
    }

    #[test]
    fn code_lists_translate_both_ways() {
        let inbound = Transform::Codes(FUEL).apply(Direction::ToCanonical, &json!("BENZIN"), &at());
        assert_eq!(inbound, Ok(json!("petrol")));
        let outbound = Transform::Codes(FUEL).apply(Direction::ToWire, &json!("diesel"), &at());
        assert_eq!(outbound, Ok(json!("DIESEL")));
        assert_eq!(
            Transform::Codes(FUEL).apply(Direction::ToCanonical, &json!("ELEKTRO"), &at()),
            Err(MappingError::UnknownCode {
                path: "vehicle.fuel".to_string(),
                code: "ELEKTRO".to_string()
            })
        );
    }

    #[test]
    fn litres_scale_to_whole_cubic_centimetres() {
        let scale = Transform::Scale(1000.0);
        assert_eq!(scale.apply(Direction::ToCanonical, &json!(1.598), &at()), Ok(json!(1598)));
        assert_eq!(scale.apply(Direction::ToCanonical, &json!("1,4"), &at()), Ok(json!(1400)));
        assert_eq!(scale.apply(Direction::ToWire, &json!(1500), &at()), Ok(json!(1.5)));
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(Transform::Integer.apply(Direction::ToCanonical, &json!("12000"), &at()), Ok(json!(12000)));
        assert!(matches!(
            Transform::Integer.apply(Direction::ToCanonical, &json!(2.5), &at()),
            Err(MappingError::InvalidValue { .. })
        ));
    }

    #[test]
    fn dates_and_flags_are_normalised() {
        assert_eq!(
            Transform::Date.apply(Direction::ToCanonical, &json!("01.03.2004"), &at()),
            Ok(json!("2004-03-01"))
        );
        assert_eq!(Transform::YesNo.apply(Direction::ToCanonical, &json!("J"), &at()), Ok(json!(true)));
        assert!(Transform::YesNo.apply(Direction::ToCanonical, &json!("maybe"), &at()).is_err());
    }
}
