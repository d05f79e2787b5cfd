//! Rule tables and the accumulating checker that evaluates them.
//!
//! Rules address the wire tree with dotted paths. A `[]` segment fans out over
//! every item of a list, so `convictions[].date` reports against
//! `convictions[0].date`, `convictions[1].date` and so on.

use super::{MessageHeader, NormStandard, Operation, StandardRequest, WireError};
use crate::canonical::{EARLIEST_MODEL_YEAR, MAX_DRIVER_AGE, MIN_DRIVER_AGE};
use crate::path::FieldPath;
use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    Required,
    InvalidEnum,
    OutOfRange,
    InvalidPattern,
    ConditionalRequired,
    MinItems,
    MinLength,
    ConditionalConstraint,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::Required => "REQUIRED",
            ValidationCode::InvalidEnum => "INVALID_ENUM",
            ValidationCode::OutOfRange => "OUT_OF_RANGE",
            ValidationCode::InvalidPattern => "INVALID_PATTERN",
            ValidationCode::ConditionalRequired => "CONDITIONAL_REQUIRED",
            ValidationCode::MinItems => "MIN_ITEMS",
            ValidationCode::MinLength => "MIN_LENGTH",
            ValidationCode::ConditionalConstraint => "CONDITIONAL_CONSTRAINT",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field_path: String,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            code,
            message: message.into(),
        }
    }

    pub fn to_wire(&self) -> WireError {
        WireError::error(self.code.as_str(), self.message.clone()).with_field(self.field_path.clone())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.field_path, self.message)
    }
}

/// What the validator needs beyond the message itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    /// Operation implied by the endpoint the message arrived on.
    pub operation: Operation,
    /// Evaluation date for age and model-year rules.
    pub today: NaiveDate,
}

/// One compiled-in field rule.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    Required(&'static str),
    OneOf(&'static str, &'static [&'static str]),
    Range(&'static str, f64, f64),
    Positive(&'static str),
    /// Path, regular expression, human description of the format.
    Pattern(&'static str, &'static str, &'static str),
    MinItems(&'static str, usize),
    MinLength(&'static str, usize),
    Date(&'static str),
    /// Value must be a string, not a number or flag.
    Text(&'static str),
}

impl FieldRule {
    pub fn path(&self) -> &'static str {
        match *self {
            FieldRule::Required(path)
            | FieldRule::OneOf(path, _)
            | FieldRule::Range(path, _, _)
            | FieldRule::Positive(path)
            | FieldRule::Pattern(path, _, _)
            | FieldRule::MinItems(path, _)
            | FieldRule::MinLength(path, _)
            | FieldRule::Date(path)
            | FieldRule::Text(path) => path,
        }
    }
}

/// `YYYY-MM-DD` or a full RFC 3339 timestamp. Field rules accept nothing else.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|stamp| stamp.date_naive()))
}

/// Lenient reading used when mapping wire values: ISO dates, ISO timestamps
/// (date part) and `DD.MM.YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some((day_part, _)) = raw.split_once('T') {
        if let Ok(date) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%d.%m.%Y").ok()
}

/// Number or numeric string.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

/// Boolean or a yes/no code.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "J" | "JA" | "Y" | "YES" => Some(true),
            "FALSE" | "N" | "NEE" | "NEIN" | "NO" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Compiled patterns, shared by every validator.
fn compiled(pattern: &'static str) -> Option<Regex> {
    static CACHE: OnceLock<Mutex<HashMap<&'static str, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(regex) = guard.get(pattern) {
        return Some(regex.clone());
    }
    match Regex::new(pattern) {
        Ok(regex) => {
            guard.insert(pattern, regex.clone());
            Some(regex)
        }
        Err(err) => {
            warn!(%pattern, error = %err, "skipping rule with invalid pattern");
            None
        }
    }
}

/// Every concrete path matched by `pattern`, with the value found there.
/// Lists that are absent produce no paths.
pub fn expand<'v>(tree: &'v Value, pattern: &str) -> Vec<(FieldPath, Option<&'v Value>)> {
    let parts: Vec<&str> = pattern.split("[]").collect();
    let mut current: Vec<(FieldPath, Option<&'v Value>)> = vec![(FieldPath::root(), Some(tree))];

    for (position, part) in parts.iter().enumerate() {
        let relative = FieldPath::parse(part.trim_start_matches('.'));
        let last = position + 1 == parts.len();
        let mut next = Vec::new();
        for (path, value) in current {
            let path = path.join(&relative);
            let found = value.and_then(|v| relative.lookup(v));
            if last {
                next.push((path, found));
            } else if let Some(Value::Array(items)) = found {
                for (index, item) in items.iter().enumerate() {
                    next.push((path.index(index), Some(item)));
                }
            }
        }
        current = next;
    }
    current
}

/// Accumulates errors over one tree. Nothing short-circuits: every rule runs.
pub struct Checker<'a> {
    tree: &'a Value,
    errors: Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    pub fn new(tree: &'a Value) -> Self {
        Self {
            tree,
            errors: Vec::new(),
        }
    }

    pub fn value(&self, path: &str) -> Option<&'a Value> {
        FieldPath::parse(path)
            .lookup(self.tree)
            .filter(|value| !value.is_null())
    }

    pub fn push(&mut self, path: impl Into<String>, code: ValidationCode, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, code, message));
    }

    pub fn apply(&mut self, rules: &[FieldRule]) {
        for rule in rules {
            self.apply_one(rule);
        }
    }

    fn apply_one(&mut self, rule: &FieldRule) {
        let matches = expand(self.tree, rule.path());
        for (path, value) in matches {
            if let FieldRule::Required(_) = rule {
                if is_blank(value) {
                    self.push(path.to_string(), ValidationCode::Required, format!("{path} is required"));
                }
                continue;
            }
            if let FieldRule::MinItems(_, min) = rule {
                let count = match value {
                    Some(Value::Array(items)) => items.len(),
                    _ => 0,
                };
                if count < *min {
                    self.push(
                        path.to_string(),
                        ValidationCode::MinItems,
                        format!("{path} needs at least {min} item(s), found {count}"),
                    );
                }
                continue;
            }
            let Some(value) = value.filter(|v| !is_blank(Some(*v))) else {
                continue;
            };
            self.check_present(rule, &path, value);
        }
    }

    fn check_present(&mut self, rule: &FieldRule, path: &FieldPath, value: &Value) {
        match *rule {
            FieldRule::OneOf(_, allowed) => {
                let valid = matches!(value, Value::String(code) if allowed.contains(&code.trim()));
                if !valid {
                    self.push(
                        path.to_string(),
                        ValidationCode::InvalidEnum,
                        format!("{path} must be one of {}", allowed.join(", ")),
                    );
                }
            }
            FieldRule::Range(_, min, max) => match numeric(value) {
                Some(number) if (min..=max).contains(&number) => {}
                _ => self.push(
                    path.to_string(),
                    ValidationCode::OutOfRange,
                    format!("{path} must be a number between {min} and {max}"),
                ),
            },
            FieldRule::Positive(_) => match numeric(value) {
                Some(number) if number > 0.0 && number.is_finite() => {}
                _ => self.push(
                    path.to_string(),
                    ValidationCode::OutOfRange,
                    format!("{path} must be greater than zero"),
                ),
            },
            FieldRule::Pattern(_, pattern, description) => {
                let Some(regex) = compiled(pattern) else {
                    return;
                };
                let matched = text_of(value).is_some_and(|text| regex.is_match(&text));
                if !matched {
                    self.push(
                        path.to_string(),
                        ValidationCode::InvalidPattern,
                        format!("{path} must be {description}"),
                    );
                }
            }
            FieldRule::MinLength(_, min) => {
                let length = text_of(value).map(|text| text.chars().count()).unwrap_or(0);
                if length < min {
                    self.push(
                        path.to_string(),
                        ValidationCode::MinLength,
                        format!("{path} must be at least {min} characters"),
                    );
                }
            }
            FieldRule::Date(_) => {
                let valid = value.as_str().and_then(parse_iso_date).is_some();
                if !valid {
                    self.push(
                        path.to_string(),
                        ValidationCode::InvalidPattern,
                        format!("{path} must be a date (YYYY-MM-DD)"),
                    );
                }
            }
            FieldRule::Text(_) => {
                if !value.is_string() {
                    self.push(
                        path.to_string(),
                        ValidationCode::InvalidPattern,
                        format!("{path} must be text"),
                    );
                }
            }
            FieldRule::Required(_) | FieldRule::MinItems(_, _) => {}
        }
    }

    /// When `trigger` is present and satisfies `test`, `target` must be present
    /// and, for lists, hold at least one item.
    pub fn conditional_required(
        &mut self,
        trigger: &str,
        test: impl Fn(&Value) -> bool,
        target: &str,
    ) {
        let Some(trigger_value) = self.value(trigger) else {
            return;
        };
        if !test(trigger_value) {
            return;
        }
        let missing = match self.value(target) {
            None => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(other) => is_blank(Some(other)),
        };
        if missing {
            self.push(
                target,
                ValidationCode::ConditionalRequired,
                format!("{target} is required when {trigger} is set"),
            );
        }
    }

    /// When `trigger` is present and satisfies `test`, `target` must satisfy
    /// `holds`. A missing target counts as a violation.
    pub fn conditional_constraint(
        &mut self,
        trigger: &str,
        test: impl Fn(&Value) -> bool,
        target: &str,
        holds: impl Fn(&Value) -> bool,
        message: &str,
    ) {
        let Some(trigger_value) = self.value(trigger) else {
            return;
        };
        if !test(trigger_value) {
            return;
        }
        let satisfied = self.value(target).is_some_and(|value| holds(value));
        if !satisfied {
            self.push(target, ValidationCode::ConditionalConstraint, message);
        }
    }

    /// Model year within `[1900, next year]` relative to `today`.
    pub fn model_year(&mut self, path: &str, today: NaiveDate) {
        let Some(value) = self.value(path).filter(|v| !is_blank(Some(*v))) else {
            return;
        };
        let latest = f64::from(today.year() + 1);
        let earliest = f64::from(EARLIEST_MODEL_YEAR);
        match numeric(value) {
            Some(year) if year.fract() == 0.0 && (earliest..=latest).contains(&year) => {}
            _ => self.push(
                path,
                ValidationCode::OutOfRange,
                format!("{path} must be a year between {EARLIEST_MODEL_YEAR} and {latest}"),
            ),
        }
    }

    /// Date of birth giving an insurable age on `today`.
    pub fn driver_age(&mut self, path: &str, today: NaiveDate) {
        let Some(raw) = self.value(path).and_then(Value::as_str) else {
            return;
        };
        let Some(born) = parse_iso_date(raw) else {
            return;
        };
        let insurable = today
            .years_since(born)
            .is_some_and(|age| (MIN_DRIVER_AGE..=MAX_DRIVER_AGE).contains(&age));
        if !insurable {
            self.push(
                path,
                ValidationCode::OutOfRange,
                format!("driver age must be between {MIN_DRIVER_AGE} and {MAX_DRIVER_AGE}"),
            );
        }
    }

    pub fn finish(self) -> Vec<ValidationError> {
        self.errors
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }
}

/// Checks shared by every standard: header presence, version support and the
/// operation matching the endpoint.
pub fn check_envelope(
    standard: NormStandard,
    request: &StandardRequest,
    version: &str,
    context: &ValidationContext,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let header: &MessageHeader = request.header();

    let required = [
        ("messageHeader.messageId", &header.message_id),
        ("messageHeader.sender", &header.sender),
    ];
    for (path, value) in required {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            errors.push(ValidationError::new(
                path,
                ValidationCode::Required,
                format!("{path} is required"),
            ));
        }
    }

    if version.trim().is_empty() {
        errors.push(ValidationError::new(
            "messageHeader.normVersion",
            ValidationCode::Required,
            "messageHeader.normVersion is required",
        ));
    } else if !standard.supports_version(version) {
        errors.push(ValidationError::new(
            "messageHeader.normVersion",
            ValidationCode::InvalidEnum,
            format!(
                "{} does not support version '{}'; supported: {}",
                standard.display_name(),
                version.trim(),
                standard.supported_versions().join(", ")
            ),
        ));
    }

    if let Some(raw) = request.operation() {
        if Operation::parse(raw) != Some(context.operation) {
            errors.push(ValidationError::new(
                "operation",
                ValidationCode::InvalidEnum,
                format!(
                    "operation '{}' does not match the {} endpoint",
                    raw.trim(),
                    context.operation
                ),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: &[FieldRule] = &[
        FieldRule::Required("vehicle.make"),
        FieldRule::Required("vehicle.model"),
        FieldRule::Required("driver.dateOfBirth"),
        FieldRule::OneOf("vehicle.fuel", &["PETROL", "DIESEL"]),
        FieldRule::Range("driver.points", 0.0, 18.0),
        FieldRule::Pattern("address.postalCode", r"^[0-9]{5}$", "five digits"),
        FieldRule::Required("convictions[].date"),
        FieldRule::Date("driver.dateOfBirth"),
    ];

    #[test]
    fn each_missing_required_field_is_reported_once() {
        let tree = json!({ "vehicle": {}, "driver": {} });
        let mut checker = Checker::new(&tree);
        checker.apply(&RULES[..3]);
        let errors = checker.finish();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.code == ValidationCode::Required));
        let paths: Vec<&str> = errors.iter().map(|e| e.field_path.as_str()).collect();
        assert_eq!(paths, vec!["vehicle.make", "vehicle.model", "driver.dateOfBirth"]);
    }

    #[test]
    fn list_rules_report_indexed_paths() {
        let tree = json!({
            "vehicle": { "make": "VW", "model": "Golf", "fuel": "KEROSENE" },
            "driver": { "dateOfBirth": "1990-13-01", "points": 40 },
            "address": { "postalCode": "1011" },
            "convictions": [ { "date": "2024-01-01" }, { "code": "SP30" } ]
        });
        let mut checker = Checker::new(&tree);
        checker.apply(RULES);
        let errors = checker.finish();
        let summary: Vec<(String, ValidationCode)> = errors
            .iter()
            .map(|e| (e.field_path.clone(), e.code))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("vehicle.fuel".to_string(), ValidationCode::InvalidEnum),
                ("driver.points".to_string(), ValidationCode::OutOfRange),
                ("address.postalCode".to_string(), ValidationCode::InvalidPattern),
                ("convictions[1].date".to_string(), ValidationCode::Required),
                ("driver.dateOfBirth".to_string(), ValidationCode::InvalidPattern),
            ]
        );
    }

    #[test]
    fn cross_field_rules_only_fire_when_triggered() {
        let tree = json!({ "hasClaims": false, "licence": { "type": "FULL", "country": "AT" } });
        let mut checker = Checker::new(&tree);
        checker.conditional_required("hasClaims", |v| v == &json!(true), "claims");
        checker.conditional_required("hasConvictions", |v| v == &json!(true), "convictions");
        checker.conditional_constraint(
            "licence.type",
            |v| v == "FULL",
            "licence.country",
            |v| v == "DE",
            "a full licence must be issued in DE",
        );
        let errors = checker.finish();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ValidationCode::ConditionalConstraint);
        assert_eq!(errors[0].field_path, "licence.country");
    }

    #[test]
    fn model_year_and_age_follow_the_evaluation_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");
        let tree = json!({
            "ok": { "year": 2027, "born": "1990-05-01" },
            "bad": { "year": "2028", "born": "2010-01-01" }
        });
        let mut checker = Checker::new(&tree);
        checker.model_year("ok.year", today);
        checker.driver_age("ok.born", today);
        checker.model_year("bad.year", today);
        checker.driver_age("bad.born", today);
        checker.model_year("missing.year", today);
        let paths: Vec<String> = checker.finish().into_iter().map(|e| e.field_path).collect();
        assert_eq!(paths, vec!["bad.year", "bad.born"]);
    }

    #[test]
    fn date_rules_take_iso_dates_and_full_timestamps_only() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_iso_date("2024-03-09"), expected);
        assert_eq!(parse_iso_date("2024-03-09T10:00:00Z"), expected);
        assert_eq!(parse_iso_date("09.03.2024"), None);
        assert_eq!(parse_iso_date("2024-03-09Tgarbage"), None);

        let tree = json!({
            "driver": { "dateOfBirth": "30.08.1979" },
            "policy": { "startDate": "2026-11-01Tgarbage", "endDate": "2027-11-01T00:00:00+01:00" }
        });
        let mut checker = Checker::new(&tree);
        checker.apply(&[
            FieldRule::Date("driver.dateOfBirth"),
            FieldRule::Date("policy.startDate"),
            FieldRule::Date("policy.endDate"),
        ]);
        let paths: Vec<String> = checker.finish().into_iter().map(|e| e.field_path).collect();
        assert_eq!(paths, vec!["driver.dateOfBirth", "policy.startDate"]);
    }

    #[test]
    fn mapping_dates_still_read_the_wire_spellings() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date("2024-03-09T10:00:00Z"), expected);
        assert_eq!(parse_date("09.03.2024"), expected);
        assert_eq!(parse_date("March 9"), None);
    }
}
