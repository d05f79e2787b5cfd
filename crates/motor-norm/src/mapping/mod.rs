//! Declarative field mapping between wire payload trees and the canonical model.
//!
//! Each standard family has one rule table per operation and direction. The
//! same request table runs in both directions: wire to canonical on ingress,
//! canonical to wire when the adapter acts as a client. Wire leaves no rule
//! consumes are returned as an extension bag instead of being dropped.

pub mod tables;
mod transform;

pub use transform::{CodeTable, Transform};

use crate::canonical::{
    ClaimNotification, PremiumQuote, QuoteRequest, ReserveAssessment, ReserveModifierKind,
};
use crate::norms::{NormFamily, NormStandard, Operation};
use crate::path::{leaves, FieldPath, PathConflict};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("required field '{wire}' (canonical '{canonical}') is missing")]
    MissingField { wire: String, canonical: String },
    #[error("field '{path}': {reason}")]
    InvalidValue { path: String, reason: String },
    #[error("field '{path}': no mapping for code '{code}'")]
    UnknownCode { path: String, code: String },
    #[error(transparent)]
    Conflict(#[from] PathConflict),
    #[error("mapped data does not fit the canonical model: {0}")]
    Shape(String),
    #[error("no mapping table for {operation}")]
    NoTable { operation: Operation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    ToCanonical,
    ToWire,
}

/// One row of a mapping table. Paths are relative to the enclosing list item
/// when the rule sits inside [`Rule::List`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Field {
        canonical: &'static str,
        wire: &'static str,
        transform: Transform,
        required: bool,
    },
    /// List of objects, each mapped with `items`.
    List {
        canonical: &'static str,
        wire: &'static str,
        items: &'static [Rule],
    },
    /// List of scalars, each converted with `transform`.
    Values {
        canonical: &'static str,
        wire: &'static str,
        transform: Transform,
    },
    /// Wire yes/no field that stands for membership of `member` in a canonical list.
    Flag {
        canonical: &'static str,
        member: &'static str,
        wire: &'static str,
    },
    /// Wire field accepted without a canonical counterpart. Never copied and
    /// never reported as an extension.
    Consumed(&'static str),
}

pub const fn required(canonical: &'static str, wire: &'static str, transform: Transform) -> Rule {
    Rule::Field {
        canonical,
        wire,
        transform,
        required: true,
    }
}

pub const fn optional(canonical: &'static str, wire: &'static str, transform: Transform) -> Rule {
    Rule::Field {
        canonical,
        wire,
        transform,
        required: false,
    }
}

pub const fn list(canonical: &'static str, wire: &'static str, items: &'static [Rule]) -> Rule {
    Rule::List {
        canonical,
        wire,
        items,
    }
}

pub const fn values(canonical: &'static str, wire: &'static str, transform: Transform) -> Rule {
    Rule::Values {
        canonical,
        wire,
        transform,
    }
}

pub const fn flag(canonical: &'static str, member: &'static str, wire: &'static str) -> Rule {
    Rule::Flag {
        canonical,
        member,
        wire,
    }
}

/// Canonical value plus the wire leaves no rule consumed, keyed by wire path.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped<T> {
    pub value: T,
    pub extensions: Map<String, Value>,
}

struct Pass<'s> {
    direction: Direction,
    source: &'s Value,
    target: Value,
    consumed: Vec<FieldPath>,
}

impl<'s> Pass<'s> {
    fn new(direction: Direction, source: &'s Value) -> Self {
        Self {
            direction,
            source,
            target: Value::Object(Map::new()),
            consumed: Vec::new(),
        }
    }

    /// `(source, target)` paths for a rule, relative to the current bases.
    fn sides(
        &self,
        canonical: &str,
        wire: &str,
        from: &FieldPath,
        to: &FieldPath,
    ) -> (FieldPath, FieldPath) {
        let (source, target) = match self.direction {
            Direction::ToCanonical => (wire, canonical),
            Direction::ToWire => (canonical, wire),
        };
        (from.join(&FieldPath::parse(source)), to.join(&FieldPath::parse(target)))
    }

    fn missing(&self, source: &FieldPath, target: &FieldPath) -> MappingError {
        let (wire, canonical) = match self.direction {
            Direction::ToCanonical => (source, target),
            Direction::ToWire => (target, source),
        };
        MappingError::MissingField {
            wire: wire.to_string(),
            canonical: canonical.to_string(),
        }
    }

    fn run(&mut self, rules: &[Rule], from: &FieldPath, to: &FieldPath) -> Result<(), MappingError> {
        for rule in rules {
            match *rule {
                Rule::Field {
                    canonical,
                    wire,
                    transform,
                    required,
                } => {
                    let (source, target) = self.sides(canonical, wire, from, to);
                    let found = source.lookup(self.source);
                    if found.is_some() {
                        self.consumed.push(source.clone());
                    }
                    match found.filter(|value| !is_blank(value)) {
                        Some(value) => {
                            let converted = transform.apply(self.direction, value, &source)?;
                            target.insert(&mut self.target, converted)?;
                        }
                        None if required => return Err(self.missing(&source, &target)),
                        None => {}
                    }
                }
                Rule::List {
                    canonical,
                    wire,
                    items,
                } => {
                    let (source, target) = self.sides(canonical, wire, from, to);
                    let Some(entries) = self.list_at(&source)? else {
                        continue;
                    };
                    if entries.is_empty() {
                        self.consumed.push(source);
                        continue;
                    }
                    for index in 0..entries.len() {
                        self.run(items, &source.index(index), &target.index(index))?;
                    }
                }
                Rule::Values {
                    canonical,
                    wire,
                    transform,
                } => {
                    let (source, target) = self.sides(canonical, wire, from, to);
                    let Some(entries) = self.list_at(&source)? else {
                        continue;
                    };
                    self.consumed.push(source.clone());
                    if entries.is_empty() {
                        continue;
                    }
                    let converted = entries
                        .iter()
                        .enumerate()
                        .map(|(index, entry)| transform.apply(self.direction, entry, &source.index(index)))
                        .collect::<Result<Vec<_>, _>>()?;
                    target.insert(&mut self.target, Value::Array(converted))?;
                }
                Rule::Flag {
                    canonical,
                    member,
                    wire,
                } => self.flag(canonical, member, wire, from, to)?,
                Rule::Consumed(wire) => {
                    if self.direction == Direction::ToCanonical {
                        self.consumed.push(from.join(&FieldPath::parse(wire)));
                    }
                }
            }
        }
        Ok(())
    }

    fn list_at(&self, source: &FieldPath) -> Result<Option<&'s Vec<Value>>, MappingError> {
        match source.lookup(self.source) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(entries)) => Ok(Some(entries)),
            Some(other) => Err(MappingError::InvalidValue {
                path: source.to_string(),
                reason: format!("expected a list, found {other}"),
            }),
        }
    }

    fn flag(
        &mut self,
        canonical: &str,
        member: &str,
        wire: &str,
        from: &FieldPath,
        to: &FieldPath,
    ) -> Result<(), MappingError> {
        match self.direction {
            Direction::ToCanonical => {
                let source = from.join(&FieldPath::parse(wire));
                let Some(value) = source.lookup(self.source) else {
                    return Ok(());
                };
                self.consumed.push(source.clone());
                if is_blank(value) {
                    return Ok(());
                }
                if Transform::YesNo.apply(self.direction, value, &source)? == Value::Bool(true) {
                    let target = to.join(&FieldPath::parse(canonical));
                    let mut members = target
                        .lookup(&self.target)
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    members.push(Value::String(member.to_string()));
                    target.insert(&mut self.target, Value::Array(members))?;
                }
            }
            Direction::ToWire => {
                let source = from.join(&FieldPath::parse(canonical));
                let present = source
                    .lookup(self.source)
                    .and_then(Value::as_array)
                    .is_some_and(|members| members.iter().any(|m| m.as_str() == Some(member)));
                to.join(&FieldPath::parse(wire))
                    .insert(&mut self.target, Value::Bool(present))?;
            }
        }
        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Maps a wire tree into a canonical tree. Returns the tree and the extension bag.
pub fn to_canonical(rules: &[Rule], wire: &Value) -> Result<(Value, Map<String, Value>), MappingError> {
    let mut pass = Pass::new(Direction::ToCanonical, wire);
    pass.run(rules, &FieldPath::root(), &FieldPath::root())?;

    let extensions = leaves(wire, &FieldPath::root())
        .into_iter()
        .filter(|(path, value)| {
            !value.is_null() && !pass.consumed.iter().any(|consumed| path.starts_with(consumed))
        })
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect();
    Ok((pass.target, extensions))
}

/// Maps a canonical tree onto the wire shape described by `rules`.
pub fn to_wire(rules: &[Rule], canonical: &Value) -> Result<Value, MappingError> {
    let mut pass = Pass::new(Direction::ToWire, canonical);
    pass.run(rules, &FieldPath::root(), &FieldPath::root())?;
    Ok(pass.target)
}

fn request_rules(family: NormFamily, operation: Operation) -> Result<&'static [Rule], MappingError> {
    tables::request_rules(family, operation).ok_or(MappingError::NoTable { operation })
}

fn result_rules(family: NormFamily, operation: Operation) -> Result<&'static [Rule], MappingError> {
    tables::result_rules(family, operation).ok_or(MappingError::NoTable { operation })
}

fn canonical_tree<T: Serialize>(value: &T) -> Result<Value, MappingError> {
    serde_json::to_value(value).map_err(|err| MappingError::Shape(err.to_string()))
}

fn inbound<T: serde::de::DeserializeOwned>(
    family: NormFamily,
    operation: Operation,
    wire: &Value,
) -> Result<Mapped<T>, MappingError> {
    let (tree, extensions) = to_canonical(request_rules(family, operation)?, wire)?;
    let value = serde_json::from_value(tree).map_err(|err| MappingError::Shape(err.to_string()))?;
    Ok(Mapped { value, extensions })
}

pub fn quote_request(family: NormFamily, wire: &Value) -> Result<Mapped<QuoteRequest>, MappingError> {
    inbound(family, Operation::Tariff, wire)
}

pub fn claim_notification(
    family: NormFamily,
    wire: &Value,
) -> Result<Mapped<ClaimNotification>, MappingError> {
    inbound(family, Operation::Reserve, wire)
}

pub fn quote_request_to_wire(family: NormFamily, request: &QuoteRequest) -> Result<Value, MappingError> {
    to_wire(request_rules(family, Operation::Tariff)?, &canonical_tree(request)?)
}

pub fn claim_to_wire(family: NormFamily, claim: &ClaimNotification) -> Result<Value, MappingError> {
    to_wire(request_rules(family, Operation::Reserve)?, &canonical_tree(claim)?)
}

pub fn quote_result(family: NormFamily, quote: &PremiumQuote) -> Result<Value, MappingError> {
    to_wire(result_rules(family, Operation::Tariff)?, &canonical_tree(quote)?)
}

/// Reserve result. Modifier totals are exposed as `loads.*` for wire formats
/// without a modifier list.
pub fn reserve_result(family: NormFamily, assessment: &ReserveAssessment) -> Result<Value, MappingError> {
    let mut view = canonical_tree(assessment)?;
    let estimate = &assessment.estimate;
    FieldPath::parse("loads").insert(
        &mut view,
        json!({
            "fraud": estimate.modifier(ReserveModifierKind::Fraud),
            "liability": estimate.modifier(ReserveModifierKind::Liability),
            "partsBackorder": estimate.modifier(ReserveModifierKind::PartsBackorder),
        }),
    )?;
    to_wire(result_rules(family, Operation::Reserve)?, &view)
}

/// One mapped request field, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub operation: Operation,
    pub wire_path: String,
    pub canonical_path: String,
    pub required: bool,
    pub transform: &'static str,
}

/// Request fields of every operation of `standard`. List items use `[]`.
pub fn field_definitions(standard: NormStandard) -> Vec<FieldDefinition> {
    let mut definitions = Vec::new();
    for operation in [Operation::Tariff, Operation::Reserve] {
        if let Some(rules) = tables::request_rules(standard.family(), operation) {
            describe(rules, operation, "", "", &mut definitions);
        }
    }
    definitions
}

fn describe(
    rules: &[Rule],
    operation: Operation,
    wire_base: &str,
    canonical_base: &str,
    out: &mut Vec<FieldDefinition>,
) {
    let joined = |base: &str, path: &str| {
        if base.is_empty() {
            path.to_string()
        } else {
            format!("{base}.{path}")
        }
    };
    for rule in rules {
        match *rule {
            Rule::Field {
                canonical,
                wire,
                transform,
                required,
            } => out.push(FieldDefinition {
                operation,
                wire_path: joined(wire_base, wire),
                canonical_path: joined(canonical_base, canonical),
                required,
                transform: transform.name(),
            }),
            Rule::List {
                canonical,
                wire,
                items,
            } => describe(
                items,
                operation,
                &format!("{}[]", joined(wire_base, wire)),
                &format!("{}[]", joined(canonical_base, canonical)),
                out,
            ),
            Rule::Values {
                canonical,
                wire,
                transform,
            } => out.push(FieldDefinition {
                operation,
                wire_path: format!("{}[]", joined(wire_base, wire)),
                canonical_path: format!("{}[]", joined(canonical_base, canonical)),
                required: false,
                transform: transform.name(),
            }),
            Rule::Flag {
                canonical,
                member,
                wire,
            } => out.push(FieldDefinition {
                operation,
                wire_path: joined(wire_base, wire),
                canonical_path: format!("{}[{member}]", joined(canonical_base, canonical)),
                required: false,
                transform: Transform::YesNo.name(),
            }),
            Rule::Consumed(_) => {}
        }
    }
}
