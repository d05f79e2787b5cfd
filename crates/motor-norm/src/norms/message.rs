use super::{gdv, NormStandard};
use crate::codecs::fixed_width::{FixedRecord, FixedWidthError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Routing header shared by every standard. Fields stay optional so that a
/// missing value can be reported by validation instead of failing decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm_version: Option<String>,
}

/// Header, operation and payload tree of a SOAP or JSON message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBody {
    pub header: MessageHeader,
    pub operation: Option<String>,
    pub data: Value,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiproFlavour {
    RClassic,
    RNext,
}

#[derive(Clone, PartialEq)]
pub struct UsernameToken {
    pub username: String,
    pub password: String,
    pub created: Option<String>,
    pub expires: Option<String>,
}

impl fmt::Debug for UsernameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernameToken")
            .field("username", &self.username)
            .field("password", &"***")
            .field("created", &self.created)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Caller credentials. Username tokens travel in the SOAP security header;
/// bearer tokens only ever travel as an HTTP header.
#[derive(Clone, PartialEq)]
pub enum Credentials {
    UsernameToken(UsernameToken),
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::UsernameToken(token) => token.fmt(f),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiproRequest {
    pub flavour: BiproFlavour,
    pub credentials: Option<Credentials>,
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiviRequest {
    pub credentials: Option<Credentials>,
    pub body: MessageBody,
}

/// Positional GDV message: a header record followed by data records.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRequest {
    pub header: MessageHeader,
    pub operation: Option<String>,
    pub records: Vec<FixedRecord>,
}

/// A decoded inbound message, one variant per standard family.
#[derive(Debug, Clone, PartialEq)]
pub enum StandardRequest {
    Bipro(BiproRequest),
    Sivi(SiviRequest),
    Legacy(LegacyRequest),
}

impl StandardRequest {
    pub fn standard(&self) -> NormStandard {
        match self {
            StandardRequest::Bipro(request) => match request.flavour {
                BiproFlavour::RClassic => NormStandard::BiproRclassic,
                BiproFlavour::RNext => NormStandard::BiproRnext,
            },
            StandardRequest::Sivi(_) => NormStandard::SiviAfs,
            StandardRequest::Legacy(_) => NormStandard::Gdv,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            StandardRequest::Bipro(request) => &request.body.header,
            StandardRequest::Sivi(request) => &request.body.header,
            StandardRequest::Legacy(request) => &request.header,
        }
    }

    pub fn operation(&self) -> Option<&str> {
        match self {
            StandardRequest::Bipro(request) => request.body.operation.as_deref(),
            StandardRequest::Sivi(request) => request.body.operation.as_deref(),
            StandardRequest::Legacy(request) => request.operation.as_deref(),
        }
    }

    /// Payload as a tree. GDV records are keyed by record name.
    pub fn data_tree(&self) -> Cow<'_, Value> {
        match self {
            StandardRequest::Bipro(request) => Cow::Borrowed(&request.body.data),
            StandardRequest::Sivi(request) => Cow::Borrowed(&request.body.data),
            StandardRequest::Legacy(request) => Cow::Owned(gdv::records_to_tree(&request.records)),
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            StandardRequest::Bipro(request) => request.credentials.as_ref(),
            StandardRequest::Sivi(request) => request.credentials.as_ref(),
            StandardRequest::Legacy(_) => None,
        }
    }

    /// Attaches transport-level credentials. GDV files carry none.
    pub fn attach_credentials(&mut self, credentials: Credentials) {
        match self {
            StandardRequest::Bipro(request) => request.credentials = Some(credentials),
            StandardRequest::Sivi(request) => request.credentials = Some(credentials),
            StandardRequest::Legacy(_) => {}
        }
    }

    /// Builds an outbound request for `standard` from a wire-vocabulary tree.
    pub fn compose(
        standard: NormStandard,
        body: MessageBody,
        credentials: Option<Credentials>,
    ) -> Result<Self, FixedWidthError> {
        let request = match standard {
            NormStandard::BiproRclassic | NormStandard::BiproRnext => {
                StandardRequest::Bipro(BiproRequest {
                    flavour: if standard == NormStandard::BiproRclassic {
                        BiproFlavour::RClassic
                    } else {
                        BiproFlavour::RNext
                    },
                    credentials,
                    body,
                })
            }
            NormStandard::SiviAfs => StandardRequest::Sivi(SiviRequest { credentials, body }),
            NormStandard::Gdv => StandardRequest::Legacy(LegacyRequest {
                records: gdv::tree_to_records(&body.data)?,
                header: body.header,
                operation: body.operation,
            }),
        };
        Ok(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Success => "SUCCESS",
            ResponseStatus::Error => "ERROR",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Some(ResponseStatus::Success),
            "ERROR" => Some(ResponseStatus::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Some(Severity::Error),
            "WARNING" => Some(Severity::Warning),
            _ => None,
        }
    }
}

/// Error entry as it appears in a response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl WireError {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Error,
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Outbound message in a standard's vocabulary, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardResponse {
    pub standard: NormStandard,
    pub header: MessageHeader,
    pub operation: Option<String>,
    pub status: ResponseStatus,
    pub data: Option<Value>,
    pub errors: Vec<WireError>,
    pub metadata: Map<String, Value>,
}

impl StandardResponse {
    /// Result payload to put on the wire. A JSON `null` counts as no payload,
    /// so every codec leaves the data element out for it.
    pub fn wire_data(&self) -> Option<&Value> {
        self.data.as_ref().filter(|data| !data.is_null())
    }
}
