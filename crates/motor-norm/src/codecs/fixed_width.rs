//! Positional records of a fixed length and the GDV message codec built on
//! them.
//!
//! Positions are 1-based and measured in characters. Numeric fields are
//! right-justified and zero-padded, alphanumeric fields left-justified and
//! space-padded, dates are `DDMMYYYY`. A blank field decodes as absent.

use super::{ensure_standard, utf8, Codec, CodecError, FIXED_WIDTH_CONTENT_TYPE};
use crate::norms::gdv::{self, ERROR_RECORD, HEADER_RECORD};
use crate::norms::{
    LegacyRequest, MessageHeader, NormStandard, ResponseStatus, Severity, StandardRequest,
    StandardResponse, WireError,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

pub const RECORD_LENGTH: usize = 256;
pub const RECORD_TYPE_FIELD: &str = "RECORD_TYPE";
pub const FILLER_FIELD: &str = "FILLER";

const FORMAT: &str = "GDV";
const DATE_FORMAT: &str = "%d%m%Y";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FixedWidthError {
    #[error("record is {found} characters long, expected {expected}")]
    LineLength { expected: usize, found: usize },
    #[error("unknown record type '{0}'")]
    UnknownRecordType(String),
    #[error("{field}: value does not fit in {length} characters")]
    Overflow { field: String, length: usize },
    #[error("{field}: '{raw}' is not a valid number")]
    InvalidNumber { field: String, raw: String },
    #[error("{field}: '{raw}' is not a valid date")]
    InvalidDate { field: String, raw: String },
    #[error("{field}: a {expected} field cannot hold this value")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
    },
    #[error("a {found} record cannot be written with the {expected} layout")]
    LayoutMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("record {record} has no field {field}")]
    UnknownField { record: &'static str, field: String },
    #[error("layout {record} is invalid: {reason}")]
    InvalidLayout {
        record: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Alpha,
    /// Unsigned amount in minor units with `decimals` implied decimal places.
    Numeric { decimals: u8 },
    Date,
}

impl FieldKind {
    fn label(self) -> &'static str {
        match self {
            FieldKind::Alpha => "alphanumeric",
            FieldKind::Numeric { .. } => "numeric",
            FieldKind::Date => "date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub position: usize,
    pub length: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn alpha(name: &'static str, position: usize, length: usize) -> Self {
        Self {
            name,
            position,
            length,
            kind: FieldKind::Alpha,
        }
    }

    pub const fn numeric(name: &'static str, position: usize, length: usize, decimals: u8) -> Self {
        Self {
            name,
            position,
            length,
            kind: FieldKind::Numeric { decimals },
        }
    }

    pub const fn date(name: &'static str, position: usize) -> Self {
        Self {
            name,
            position,
            length: 8,
            kind: FieldKind::Date,
        }
    }

    /// Fields that carry no payload of their own.
    pub fn is_structural(&self) -> bool {
        self.name == RECORD_TYPE_FIELD || self.name == FILLER_FIELD
    }
}

/// Field layout of one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub record_type: &'static str,
    /// Key of the record in a payload tree.
    pub name: &'static str,
    /// Whether a message may carry several records of this type.
    pub repeatable: bool,
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Fields must start with the record type, follow each other without gaps
    /// or overlaps, and cover exactly [`RECORD_LENGTH`] characters.
    pub fn verify(&self) -> Result<(), FixedWidthError> {
        let invalid = |reason: String| FixedWidthError::InvalidLayout {
            record: self.record_type,
            reason,
        };
        if self.record_type.chars().count() != 4 {
            return Err(invalid("record type must be four characters".to_string()));
        }
        match self.fields.first() {
            Some(first) if first.name == RECORD_TYPE_FIELD && first.position == 1 && first.length == 4 => {}
            _ => return Err(invalid("first field must be RECORD_TYPE at 1/4".to_string())),
        }

        let mut next = 1;
        for field in self.fields {
            if field.length == 0 {
                return Err(invalid(format!("{} has zero length", field.name)));
            }
            if field.position != next {
                return Err(invalid(format!(
                    "{} starts at {}, expected {}",
                    field.name, field.position, next
                )));
            }
            next += field.length;
        }
        if next - 1 != RECORD_LENGTH {
            return Err(invalid(format!(
                "fields cover {} characters, expected {RECORD_LENGTH}",
                next - 1
            )));
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.name == name && !field.is_structural())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Minor units; the layout decides how many decimals are implied.
    Number(u64),
    Date(NaiveDate),
}

/// One decoded record. Absent fields are blank on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRecord {
    pub record_type: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl FixedRecord {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

pub fn encode_field(spec: &FieldSpec, value: Option<&FieldValue>) -> Result<String, FixedWidthError> {
    let width = spec.length;
    match (spec.kind, value) {
        (FieldKind::Alpha, None) | (FieldKind::Numeric { .. }, None) => Ok(" ".repeat(width)),
        (FieldKind::Date, None) => Ok("0".repeat(width)),
        (FieldKind::Alpha, Some(FieldValue::Text(text))) => {
            let flat: String = text
                .chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .take(width)
                .collect();
            Ok(format!("{flat:<width$}"))
        }
        (FieldKind::Numeric { .. }, Some(FieldValue::Number(number))) => {
            let digits = format!("{number:0width$}");
            if digits.len() > width {
                return Err(FixedWidthError::Overflow {
                    field: spec.name.to_string(),
                    length: width,
                });
            }
            Ok(digits)
        }
        (FieldKind::Date, Some(FieldValue::Date(date))) => Ok(date.format(DATE_FORMAT).to_string()),
        (kind, Some(_)) => Err(FixedWidthError::KindMismatch {
            field: spec.name,
            expected: kind.label(),
        }),
    }
}

pub fn decode_field(spec: &FieldSpec, raw: &str) -> Result<Option<FieldValue>, FixedWidthError> {
    match spec.kind {
        FieldKind::Alpha => {
            let text = raw.trim_end();
            Ok((!text.trim().is_empty()).then(|| FieldValue::Text(text.to_string())))
        }
        FieldKind::Numeric { .. } => {
            if raw.trim().is_empty() {
                return Ok(None);
            }
            if !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(FixedWidthError::InvalidNumber {
                    field: spec.name.to_string(),
                    raw: raw.to_string(),
                });
            }
            raw.parse::<u64>()
                .map(|number| Some(FieldValue::Number(number)))
                .map_err(|_| FixedWidthError::InvalidNumber {
                    field: spec.name.to_string(),
                    raw: raw.to_string(),
                })
        }
        FieldKind::Date => {
            if raw.trim().is_empty() || raw.chars().all(|c| c == '0') {
                return Ok(None);
            }
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(|date| Some(FieldValue::Date(date)))
                .map_err(|_| FixedWidthError::InvalidDate {
                    field: spec.name.to_string(),
                    raw: raw.to_string(),
                })
        }
    }
}

/// Writes `record` with `layout`, then checks the result is exactly one
/// record long.
pub fn encode_record(layout: &RecordLayout, record: &FixedRecord) -> Result<String, FixedWidthError> {
    if record.record_type != layout.record_type {
        return Err(FixedWidthError::LayoutMismatch {
            expected: layout.record_type,
            found: record.record_type.clone(),
        });
    }
    if let Some(unknown) = record.fields.keys().find(|name| layout.field(name).is_none()) {
        return Err(FixedWidthError::UnknownField {
            record: layout.record_type,
            field: unknown.clone(),
        });
    }

    let mut line = String::with_capacity(RECORD_LENGTH);
    for spec in layout.fields {
        let encoded = match spec.name {
            RECORD_TYPE_FIELD => encode_field(spec, Some(&FieldValue::Text(layout.record_type.to_string())))?,
            FILLER_FIELD => encode_field(spec, None)?,
            name => encode_field(spec, record.get(name))?,
        };
        line.push_str(&encoded);
    }

    let found = line.chars().count();
    if found != RECORD_LENGTH {
        return Err(FixedWidthError::LineLength {
            expected: RECORD_LENGTH,
            found,
        });
    }
    Ok(line)
}

/// Reads one line against the layout named by its first four characters.
pub fn decode_record(line: &str, catalogue: &[RecordLayout]) -> Result<FixedRecord, FixedWidthError> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() != RECORD_LENGTH {
        return Err(FixedWidthError::LineLength {
            expected: RECORD_LENGTH,
            found: chars.len(),
        });
    }

    let record_type: String = chars[..4].iter().collect();
    let layout = catalogue
        .iter()
        .find(|layout| layout.record_type == record_type)
        .ok_or_else(|| FixedWidthError::UnknownRecordType(record_type.clone()))?;

    let mut record = FixedRecord::new(record_type);
    for spec in layout.fields.iter().filter(|spec| !spec.is_structural()) {
        let start = spec.position - 1;
        let raw: String = chars[start..start + spec.length].iter().collect();
        if let Some(value) = decode_field(spec, &raw)? {
            record.fields.insert(spec.name.to_string(), value);
        }
    }
    Ok(record)
}

/// GDV messages: a `0001` header record followed by data records, one per
/// line. Response errors travel as `9950` records; metadata has no place on
/// the wire and is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdvCodec;

struct ParsedMessage {
    header: MessageHeader,
    operation: Option<String>,
    status: Option<String>,
    records: Vec<FixedRecord>,
}

impl GdvCodec {
    fn parse(bytes: &[u8]) -> Result<ParsedMessage, CodecError> {
        let text = utf8(bytes)?;
        let mut lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .enumerate()
            .filter(|(_, line)| !line.is_empty());

        let (_, first) = lines
            .next()
            .ok_or_else(|| CodecError::malformed(FORMAT, "message holds no records"))?;
        let header = decode_record(first, gdv::CATALOGUE)
            .map_err(|err| CodecError::malformed(FORMAT, format!("line 1: {err}")))?;
        if header.record_type != HEADER_RECORD.record_type {
            return Err(CodecError::malformed(
                FORMAT,
                format!("line 1: expected a {} header record", HEADER_RECORD.record_type),
            ));
        }

        let mut records: Vec<FixedRecord> = Vec::new();
        for (index, line) in lines {
            let record = decode_record(line, gdv::CATALOGUE)
                .map_err(|err| CodecError::malformed(FORMAT, format!("line {}: {err}", index + 1)))?;
            if record.record_type == HEADER_RECORD.record_type {
                return Err(CodecError::malformed(
                    FORMAT,
                    format!("line {}: a message carries one header record", index + 1),
                ));
            }
            if let Some(layout) = gdv::layout(&record.record_type).filter(|layout| !layout.repeatable) {
                if records.iter().any(|seen| seen.record_type == record.record_type) {
                    return Err(CodecError::malformed(
                        FORMAT,
                        format!(
                            "line {}: {} record {} appears more than once",
                            index + 1,
                            layout.name,
                            record.record_type
                        ),
                    ));
                }
            }
            records.push(record);
        }

        let timestamp = match header.text("TIMESTAMP") {
            Some(raw) => Some(
                NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
                    .map(|stamp| stamp.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                    .map_err(|_| CodecError::malformed(FORMAT, format!("line 1: bad TIMESTAMP '{raw}'")))?,
            ),
            None => None,
        };

        let text_of = |name: &str| header.text(name).map(str::to_string);
        Ok(ParsedMessage {
            header: MessageHeader {
                message_id: text_of("MESSAGE_ID"),
                timestamp,
                sender: text_of("SENDER"),
                receiver: text_of("RECEIVER"),
                norm_version: text_of("NORM_VERSION"),
            },
            operation: text_of("OPERATION"),
            status: text_of("STATUS"),
            records,
        })
    }

    fn header_record(
        header: &MessageHeader,
        operation: Option<&str>,
        status: Option<ResponseStatus>,
    ) -> Result<FixedRecord, CodecError> {
        let mut record = FixedRecord::new(HEADER_RECORD.record_type);
        let text_fields = [
            ("MESSAGE_ID", header.message_id.as_deref()),
            ("SENDER", header.sender.as_deref()),
            ("RECEIVER", header.receiver.as_deref()),
            ("NORM_VERSION", header.norm_version.as_deref()),
            ("OPERATION", operation),
            ("STATUS", status.map(ResponseStatus::as_str)),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
                record.set(name, FieldValue::Text(value.to_string()));
            }
        }
        if let Some(raw) = header.timestamp.as_deref() {
            let stamp = DateTime::parse_from_rfc3339(raw).map_err(|_| {
                CodecError::FixedWidth(FixedWidthError::InvalidDate {
                    field: "TIMESTAMP".to_string(),
                    raw: raw.to_string(),
                })
            })?;
            let utc = stamp.naive_utc();
            record.set("TIMESTAMP", FieldValue::Text(utc.format(TIMESTAMP_FORMAT).to_string()));
        }
        Ok(record)
    }

    fn write(header: FixedRecord, records: &[FixedRecord]) -> Result<Vec<u8>, CodecError> {
        let mut out = encode_record(&HEADER_RECORD, &header)?;
        out.push('\n');
        for record in records {
            let layout = gdv::layout(&record.record_type)
                .ok_or_else(|| FixedWidthError::UnknownRecordType(record.record_type.clone()))?;
            out.push_str(&encode_record(layout, record)?);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }
}

fn error_record(error: &WireError) -> FixedRecord {
    let mut record = FixedRecord::new(ERROR_RECORD.record_type)
        .with("CODE", FieldValue::Text(error.code.clone()))
        .with("SEVERITY", FieldValue::Text(error.severity.as_str().to_string()))
        .with("MESSAGE", FieldValue::Text(error.message.clone()));
    if let Some(field) = &error.field {
        record.set("FIELD", FieldValue::Text(field.clone()));
    }
    record
}

fn read_error(record: &FixedRecord) -> WireError {
    WireError {
        code: record.text("CODE").unwrap_or_default().to_string(),
        message: record.text("MESSAGE").unwrap_or_default().to_string(),
        severity: record
            .text("SEVERITY")
            .and_then(Severity::parse)
            .unwrap_or(Severity::Error),
        field: record.text("FIELD").map(str::to_string),
    }
}

impl Codec for GdvCodec {
    fn standard(&self) -> NormStandard {
        NormStandard::Gdv
    }

    fn content_type(&self) -> &'static str {
        FIXED_WIDTH_CONTENT_TYPE
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<StandardRequest, CodecError> {
        let message = Self::parse(bytes)?;
        Ok(StandardRequest::Legacy(LegacyRequest {
            header: message.header,
            operation: message.operation,
            records: message.records,
        }))
    }

    fn encode_request(&self, request: &StandardRequest) -> Result<Vec<u8>, CodecError> {
        ensure_standard(NormStandard::Gdv, request.standard())?;
        let StandardRequest::Legacy(request) = request else {
            return Err(CodecError::WrongStandard {
                codec: NormStandard::Gdv,
                found: request.standard(),
            });
        };
        let header = Self::header_record(&request.header, request.operation.as_deref(), None)?;
        Self::write(header, &request.records)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<StandardResponse, CodecError> {
        let message = Self::parse(bytes)?;
        let status = match message.status.as_deref() {
            Some(raw) => ResponseStatus::parse(raw)
                .ok_or_else(|| CodecError::malformed(FORMAT, format!("unknown STATUS '{raw}'")))?,
            None => return Err(CodecError::malformed(FORMAT, "response header carries no STATUS")),
        };

        let (errors, data): (Vec<FixedRecord>, Vec<FixedRecord>) = message
            .records
            .into_iter()
            .partition(|record| record.record_type == ERROR_RECORD.record_type);

        Ok(StandardResponse {
            standard: NormStandard::Gdv,
            header: message.header,
            operation: message.operation,
            status,
            data: (!data.is_empty()).then(|| gdv::records_to_tree(&data)),
            errors: errors.iter().map(read_error).collect(),
            metadata: serde_json::Map::new(),
        })
    }

    fn encode_response(&self, response: &StandardResponse) -> Result<Vec<u8>, CodecError> {
        ensure_standard(NormStandard::Gdv, response.standard)?;
        let header = Self::header_record(
            &response.header,
            response.operation.as_deref(),
            Some(response.status),
        )?;
        let mut records = match response.wire_data() {
            Some(tree) => gdv::tree_to_records(tree)?,
            None => Vec::new(),
        };
        records.extend(response.errors.iter().map(error_record));
        Self::write(header, &records)
    }
}
