//! Norm 430 document transfer: unpacking, GDV record parsing and receipts.
//!
//! Transfers are not idempotent. Every accepted package gets a fresh transfer
//! id, even when the same document arrives twice.

use crate::codecs::fixed_width::decode_record;
use crate::codecs::xml;
use crate::norms::{gdv, MessageHeader, Severity, ValidationCode, ValidationError, WireError};
use crate::runtime::{Clock, IdGenerator, IdKind};
use chrono::{DateTime, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{info, warn};

pub const TRANSFER_NORM_VERSION: &str = "430.2024.1";
/// Upper bound for a package after decompression.
pub const MAX_DOCUMENT_BYTES: u64 = 32 * 1024 * 1024;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferType {
    #[serde(rename = "430.1")]
    GdvData,
    #[serde(rename = "430.2")]
    PaymentIrregularities,
    #[serde(rename = "430.4")]
    ContractTransactions,
    #[serde(rename = "430.5")]
    ClaimsData,
    #[serde(rename = "430.7")]
    Documents,
}

impl TransferType {
    pub const ALL: [TransferType; 5] = [
        TransferType::GdvData,
        TransferType::PaymentIrregularities,
        TransferType::ContractTransactions,
        TransferType::ClaimsData,
        TransferType::Documents,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TransferType::GdvData => "430.1",
            TransferType::PaymentIrregularities => "430.2",
            TransferType::ContractTransactions => "430.4",
            TransferType::ClaimsData => "430.5",
            TransferType::Documents => "430.7",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|kind| kind.code() == raw)
    }

    fn formats(self) -> &'static [DocumentFormat] {
        match self {
            TransferType::GdvData => &[DocumentFormat::Gdv],
            TransferType::Documents => &[DocumentFormat::Pdf, DocumentFormat::Xml, DocumentFormat::Json],
            _ => &[DocumentFormat::Gdv, DocumentFormat::Xml, DocumentFormat::Json],
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentFormat {
    Gdv,
    Xml,
    Json,
    Pdf,
}

impl DocumentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Gdv => "GDV",
            DocumentFormat::Xml => "XML",
            DocumentFormat::Json => "JSON",
            DocumentFormat::Pdf => "PDF",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GDV" => Some(DocumentFormat::Gdv),
            "XML" => Some(DocumentFormat::Xml),
            "JSON" => Some(DocumentFormat::Json),
            "PDF" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compression {
    None,
    Gzip,
    Zip,
}

impl Compression {
    /// Detected from the leading bytes; a declared compression is not trusted.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if bytes.starts_with(ZIP_MAGIC) {
            Compression::Zip
        } else {
            Compression::None
        }
    }
}

/// Uploaded package as received from the transport. Fields stay raw so that
/// every problem can be reported at once.
#[derive(Debug, Clone, Default)]
pub struct TransferPackage {
    pub transfer_type: String,
    /// Defaults to GDV when blank.
    pub format: String,
    pub document: Vec<u8>,
    pub file_name: Option<String>,
    pub sender: Option<String>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("archive could not be unpacked: {0}")]
    Archive(String),
    #[error("document exceeds {MAX_DOCUMENT_BYTES} bytes after decompression")]
    TooLarge,
    #[error("upload could not be read: {0}")]
    Upload(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Success,
    /// Some records were accepted and some rejected.
    Partial,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub bytes_received: usize,
    pub bytes_unpacked: usize,
    pub compression: Option<Compression>,
    pub documents: usize,
    pub records: usize,
    pub rejected: usize,
    /// Accepted GDV records per record name.
    pub records_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub message_header: MessageHeader,
    pub transfer_id: String,
    pub transfer_type: TransferType,
    pub format: DocumentFormat,
    pub status: TransferStatus,
    pub processed_at: DateTime<Utc>,
    pub summary: TransferSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WireError>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

struct Document {
    name: String,
    bytes: Vec<u8>,
}

/// Accepts Norm 430 packages and issues receipts.
pub struct TransferDesk<C, G> {
    sender_id: String,
    clock: Arc<C>,
    ids: Arc<G>,
}

impl<C, G> TransferDesk<C, G>
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    pub fn new(sender_id: impl Into<String>, clock: Arc<C>, ids: Arc<G>) -> Self {
        Self {
            sender_id: sender_id.into(),
            clock,
            ids,
        }
    }

    /// Validates, unpacks and parses a package. Problems with individual
    /// records end up in the receipt; only an unusable package is an error.
    pub fn receive(&self, package: TransferPackage) -> Result<TransferReceipt, TransferError> {
        let (transfer_type, format) = validate(&package)?;

        let compression = Compression::detect(&package.document);
        let documents = unpack(&package, compression, format)?;

        let mut summary = TransferSummary {
            bytes_received: package.document.len(),
            bytes_unpacked: documents.iter().map(|document| document.bytes.len()).sum(),
            compression: Some(compression),
            documents: documents.len(),
            ..TransferSummary::default()
        };
        let mut errors = Vec::new();
        for document in &documents {
            match format {
                DocumentFormat::Gdv => parse_gdv(document, &mut summary, &mut errors),
                other => check_document(other, document, &mut summary, &mut errors),
            }
        }
        if transfer_type == TransferType::ClaimsData
            && format == DocumentFormat::Gdv
            && summary.records > 0
            && !summary.records_by_type.contains_key(gdv::CLAIM_RECORD.name)
        {
            errors.push(
                WireError::error("CLAIMS_PROCESSING_ERROR", "claims transfer carries no claim records")
                    .with_field("document"),
            );
        }

        let status = if errors.is_empty() {
            TransferStatus::Success
        } else if summary.records > 0 {
            TransferStatus::Partial
        } else {
            TransferStatus::Error
        };

        let transfer_id = self.ids.next_id(IdKind::Transfer);
        let processed_at = self.clock.now();
        info!(
            %transfer_id,
            transfer_type = %transfer_type,
            format = format.as_str(),
            records = summary.records,
            rejected = summary.rejected,
            "transfer processed"
        );
        if !errors.is_empty() {
            warn!(%transfer_id, errors = errors.len(), "transfer carried rejected content");
        }

        Ok(TransferReceipt {
            message_header: MessageHeader {
                message_id: Some(self.ids.next_id(IdKind::Message)),
                timestamp: Some(processed_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
                sender: Some(self.sender_id.clone()),
                receiver: package.sender.clone(),
                norm_version: Some(TRANSFER_NORM_VERSION.to_string()),
            },
            transfer_id,
            transfer_type,
            format,
            status,
            processed_at,
            summary,
            errors,
            metadata: package.metadata,
        })
    }
}

fn validate(package: &TransferPackage) -> Result<(TransferType, DocumentFormat), TransferError> {
    let mut errors = Vec::new();

    let transfer_type = if package.transfer_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "transferType",
            ValidationCode::Required,
            "transferType is required",
        ));
        None
    } else {
        let parsed = TransferType::parse(&package.transfer_type);
        if parsed.is_none() {
            errors.push(ValidationError::new(
                "transferType",
                ValidationCode::InvalidEnum,
                format!(
                    "transfer type '{}' is not supported; supported: {}",
                    package.transfer_type.trim(),
                    TransferType::ALL.map(TransferType::code).join(", ")
                ),
            ));
        }
        parsed
    };

    let format = if package.format.trim().is_empty() {
        Some(DocumentFormat::Gdv)
    } else {
        let parsed = DocumentFormat::parse(&package.format);
        if parsed.is_none() {
            errors.push(ValidationError::new(
                "format",
                ValidationCode::InvalidEnum,
                format!("format '{}' is not one of GDV, XML, JSON, PDF", package.format.trim()),
            ));
        }
        parsed
    };

    if let (Some(kind), Some(format)) = (transfer_type, format) {
        if !kind.formats().contains(&format) {
            errors.push(ValidationError::new(
                "format",
                ValidationCode::ConditionalConstraint,
                format!("transfer type {kind} does not accept {} documents", format.as_str()),
            ));
        }
    }

    if package.document.is_empty() {
        errors.push(ValidationError::new(
            "document",
            ValidationCode::Required,
            "document is required",
        ));
    }

    match (transfer_type, format) {
        (Some(kind), Some(format)) if errors.is_empty() => Ok((kind, format)),
        _ => Err(TransferError::Validation(errors)),
    }
}

fn unpack(
    package: &TransferPackage,
    compression: Compression,
    format: DocumentFormat,
) -> Result<Vec<Document>, TransferError> {
    let name = package.file_name.clone().unwrap_or_else(|| "document".to_string());
    match compression {
        Compression::None => Ok(vec![Document {
            name,
            bytes: package.document.clone(),
        }]),
        Compression::Gzip => {
            let bytes = read_bounded(GzDecoder::new(package.document.as_slice()))?;
            Ok(vec![Document { name, bytes }])
        }
        Compression::Zip => unzip(&package.document, format),
    }
}

/// GDV archives are joined into one stream of `.gdv`/`.txt` entries; other
/// formats keep one document per file entry.
fn unzip(bytes: &[u8], format: DocumentFormat) -> Result<Vec<Document>, TransferError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| TransferError::Archive(err.to_string()))?;

    let mut documents = Vec::new();
    let mut joined = Vec::new();
    let mut total = 0u64;
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|err| TransferError::Archive(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let lower = name.to_ascii_lowercase();
        if format == DocumentFormat::Gdv && !(lower.ends_with(".gdv") || lower.ends_with(".txt")) {
            continue;
        }
        let content = read_bounded(entry)?;
        total += content.len() as u64;
        if total > MAX_DOCUMENT_BYTES {
            return Err(TransferError::TooLarge);
        }
        if format == DocumentFormat::Gdv {
            joined.extend_from_slice(&content);
            if !joined.ends_with(b"\n") {
                joined.push(b'\n');
            }
        } else {
            documents.push(Document { name, bytes: content });
        }
    }

    if format == DocumentFormat::Gdv {
        if joined.is_empty() {
            return Err(TransferError::Archive("archive holds no .gdv or .txt entries".to_string()));
        }
        documents.push(Document {
            name: "archive".to_string(),
            bytes: joined,
        });
    } else if documents.is_empty() {
        return Err(TransferError::Archive("archive holds no documents".to_string()));
    }
    Ok(documents)
}

fn read_bounded(reader: impl Read) -> Result<Vec<u8>, TransferError> {
    let mut bytes = Vec::new();
    reader
        .take(MAX_DOCUMENT_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| TransferError::Archive(err.to_string()))?;
    if bytes.len() as u64 > MAX_DOCUMENT_BYTES {
        return Err(TransferError::TooLarge);
    }
    Ok(bytes)
}

fn parse_gdv(document: &Document, summary: &mut TransferSummary, errors: &mut Vec<WireError>) {
    let Ok(text) = std::str::from_utf8(&document.bytes) else {
        errors.push(invalid_document(document, "GDV data is not valid UTF-8"));
        return;
    };
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        match decode_record(line, gdv::CATALOGUE) {
            Ok(record) => {
                summary.records += 1;
                let name = gdv::layout(&record.record_type)
                    .map(|layout| layout.name)
                    .unwrap_or("unknown");
                *summary.records_by_type.entry(name.to_string()).or_default() += 1;
            }
            Err(err) => {
                summary.rejected += 1;
                errors.push(
                    WireError::error("GDV_RECORD_ERROR", format!("line {line_no}: {err}"))
                        .with_field(format!("{}:{line_no}", document.name)),
                );
            }
        }
    }
}

fn check_document(
    format: DocumentFormat,
    document: &Document,
    summary: &mut TransferSummary,
    errors: &mut Vec<WireError>,
) {
    let problem = match format {
        DocumentFormat::Pdf => (!document.bytes.starts_with(b"%PDF-")).then(|| "not a PDF document".to_string()),
        DocumentFormat::Json => serde_json::from_slice::<Value>(&document.bytes)
            .err()
            .map(|err| format!("invalid JSON: {err}")),
        DocumentFormat::Xml => match std::str::from_utf8(&document.bytes) {
            Ok(text) => xml::parse(text).err().map(|err| format!("invalid XML: {}", err.0)),
            Err(_) => Some("XML document is not valid UTF-8".to_string()),
        },
        DocumentFormat::Gdv => None,
    };
    match problem {
        Some(reason) => {
            summary.rejected += 1;
            errors.push(invalid_document(document, &reason));
        }
        None => summary.records += 1,
    }
}

fn invalid_document(document: &Document, reason: &str) -> WireError {
    WireError {
        code: "INVALID_DOCUMENT".to_string(),
        message: format!("{}: {reason}", document.name),
        severity: Severity::Error,
        field: Some(document.name.clone()),
    }
}
