//! BiPRO RClassic SOAP envelopes.
//!
//! Payload trees are written as nested elements. Leaves that are not strings
//! carry an `xsi:type` so numbers and booleans survive a round trip; lists
//! are `soapenc:Array` elements with `<item>` children.

use super::xml::{self, Element};
use super::{ensure_standard, utf8, Codec, CodecError, SOAP_CONTENT_TYPE};
use crate::norms::{
    BiproFlavour, BiproRequest, Credentials, MessageBody, MessageHeader, NormStandard,
    ResponseStatus, Severity, StandardRequest, StandardResponse, UsernameToken, WireError,
};
use serde_json::{Map, Number, Value};

const FORMAT: &str = "SOAP";

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
pub const BIPRO_NS: &str = "http://bipro.net/schemas/classic";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
const SOAPENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Error code that marks a fault as the server's fault rather than the caller's.
pub const SERVER_FAULT_CODE: &str = "CALCULATION_ERROR";

/// `SOAPAction` header value for an operation.
pub fn soap_action(operation: &str) -> String {
    format!("\"http://bipro.net/actions/{operation}\"")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoapCodec;

impl Codec for SoapCodec {
    fn standard(&self) -> NormStandard {
        NormStandard::BiproRclassic
    }

    fn content_type(&self) -> &'static str {
        SOAP_CONTENT_TYPE
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<StandardRequest, CodecError> {
        let envelope = parse_envelope(bytes)?;
        let body = body_of(&envelope)?;
        let request = body
            .child("Request")
            .ok_or_else(|| CodecError::malformed(FORMAT, "soap:Body holds no bipro:Request"))?;

        let credentials = envelope
            .child("Header")
            .and_then(|header| header.child("Security"))
            .and_then(read_security);

        Ok(StandardRequest::Bipro(BiproRequest {
            flavour: BiproFlavour::RClassic,
            credentials,
            body: MessageBody {
                header: read_header(request),
                operation: request.child_text("Operation"),
                data: match request.child("Data") {
                    Some(data) => element_to_value(data)?,
                    None => Value::Null,
                },
                metadata: read_metadata(request)?,
            },
        }))
    }

    fn encode_request(&self, request: &StandardRequest) -> Result<Vec<u8>, CodecError> {
        ensure_standard(self.standard(), request.standard())?;
        let StandardRequest::Bipro(request) = request else {
            return Err(CodecError::WrongStandard {
                codec: self.standard(),
                found: request.standard(),
            });
        };

        let mut payload = Element::new("bipro:Request");
        write_header(&mut payload, &request.body.header);
        if let Some(operation) = &request.body.operation {
            payload.push(Element::new("Operation").with_text(operation.as_str()));
        }
        payload.push(value_to_element("Data", &request.body.data));
        payload.push(value_to_element("Metadata", &Value::Object(request.body.metadata.clone())));

        let mut envelope = envelope_root();
        if let Some(Credentials::UsernameToken(token)) = &request.credentials {
            envelope.push(Element::new("soap:Header").with_child(security_element(token)));
        }
        envelope.push(Element::new("soap:Body").with_child(payload));
        xml::write(&envelope).map_err(|err| CodecError::malformed(FORMAT, err.0))
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<StandardResponse, CodecError> {
        let envelope = parse_envelope(bytes)?;
        let body = body_of(&envelope)?;

        if let Some(response) = body.child("Response") {
            return read_response(response);
        }

        let fault = body
            .child("Fault")
            .ok_or_else(|| CodecError::malformed(FORMAT, "soap:Body holds neither Response nor Fault"))?;
        if let Some(response) = fault.child("detail").and_then(|detail| detail.child("Response")) {
            return read_response(response);
        }

        // Faults from other systems carry no structured detail.
        Ok(StandardResponse {
            standard: NormStandard::BiproRclassic,
            header: MessageHeader::default(),
            operation: None,
            status: ResponseStatus::Error,
            data: None,
            errors: vec![WireError::error(
                fault.child_text("faultcode").unwrap_or_default(),
                fault.child_text("faultstring").unwrap_or_default(),
            )],
            metadata: Map::new(),
        })
    }

    fn encode_response(&self, response: &StandardResponse) -> Result<Vec<u8>, CodecError> {
        ensure_standard(self.standard(), response.standard)?;

        let mut payload = Element::new("bipro:Response");
        write_header(&mut payload, &response.header);
        if let Some(operation) = &response.operation {
            payload.push(Element::new("Operation").with_text(operation.as_str()));
        }
        payload.push(Element::new("Status").with_text(response.status.as_str()));
        if let Some(data) = response.wire_data() {
            payload.push(value_to_element("Data", data));
        }
        if !response.errors.is_empty() {
            let mut errors = Element::new("Errors");
            for error in &response.errors {
                errors.push(error_element(error));
            }
            payload.push(errors);
        }
        payload.push(value_to_element("Metadata", &Value::Object(response.metadata.clone())));

        let content = match response.status {
            ResponseStatus::Success => payload,
            ResponseStatus::Error => fault_element(response, payload),
        };
        let envelope = envelope_root().with_child(Element::new("soap:Body").with_child(content));
        xml::write(&envelope).map_err(|err| CodecError::malformed(FORMAT, err.0))
    }
}

fn envelope_root() -> Element {
    Element::new("soap:Envelope")
        .with_attr("xmlns:soap", SOAP_ENV_NS)
        .with_attr("xmlns:wsse", WSSE_NS)
        .with_attr("xmlns:wsu", WSU_NS)
        .with_attr("xmlns:bipro", BIPRO_NS)
        .with_attr("xmlns:xsi", XSI_NS)
        .with_attr("xmlns:xsd", XSD_NS)
        .with_attr("xmlns:soapenc", SOAPENC_NS)
}

fn parse_envelope(bytes: &[u8]) -> Result<Element, CodecError> {
    let text = utf8(bytes)?;
    let envelope = xml::parse(text).map_err(|err| CodecError::malformed(FORMAT, err.0))?;
    if envelope.local_name() != "Envelope" {
        return Err(CodecError::malformed(
            FORMAT,
            format!("root element is <{}>, expected soap:Envelope", envelope.name),
        ));
    }
    Ok(envelope)
}

fn body_of(envelope: &Element) -> Result<&Element, CodecError> {
    envelope
        .child("Body")
        .ok_or_else(|| CodecError::malformed(FORMAT, "envelope has no soap:Body"))
}

fn fault_element(response: &StandardResponse, payload: Element) -> Element {
    let server_side = response
        .errors
        .iter()
        .any(|error| error.code == SERVER_FAULT_CODE);
    let code = if server_side { "soap:Server" } else { "soap:Client" };
    let summary = response
        .errors
        .first()
        .map(|error| error.message.clone())
        .unwrap_or_else(|| "request rejected".to_string());

    Element::new("soap:Fault")
        .with_child(Element::new("faultcode").with_text(code))
        .with_child(Element::new("faultstring").with_text(summary))
        .with_child(Element::new("detail").with_child(payload))
}

fn security_element(token: &UsernameToken) -> Element {
    let mut security = Element::new("wsse:Security").with_child(
        Element::new("wsse:UsernameToken")
            .with_child(Element::new("wsse:Username").with_text(token.username.as_str()))
            .with_child(Element::new("wsse:Password").with_text(token.password.as_str())),
    );
    if token.created.is_some() || token.expires.is_some() {
        let mut timestamp = Element::new("wsu:Timestamp");
        if let Some(created) = &token.created {
            timestamp.push(Element::new("wsu:Created").with_text(created.as_str()));
        }
        if let Some(expires) = &token.expires {
            timestamp.push(Element::new("wsu:Expires").with_text(expires.as_str()));
        }
        security.push(timestamp);
    }
    security
}

fn read_security(security: &Element) -> Option<Credentials> {
    let token = security.child("UsernameToken")?;
    let timestamp = security.child("Timestamp");
    Some(Credentials::UsernameToken(UsernameToken {
        username: token.child_text("Username").unwrap_or_default(),
        password: token.child_text("Password").unwrap_or_default(),
        created: timestamp.and_then(|t| t.child_text("Created")),
        expires: timestamp.and_then(|t| t.child_text("Expires")),
    }))
}

const HEADER_FIELDS: [&str; 5] = ["MessageId", "Timestamp", "Sender", "Receiver", "NormVersion"];

fn write_header(payload: &mut Element, header: &MessageHeader) {
    let values = [
        &header.message_id,
        &header.timestamp,
        &header.sender,
        &header.receiver,
        &header.norm_version,
    ];
    for (name, value) in HEADER_FIELDS.into_iter().zip(values) {
        if let Some(value) = value {
            payload.push(Element::new(name).with_text(value.as_str()));
        }
    }
}

fn read_header(payload: &Element) -> MessageHeader {
    MessageHeader {
        message_id: payload.child_text("MessageId"),
        timestamp: payload.child_text("Timestamp"),
        sender: payload.child_text("Sender"),
        receiver: payload.child_text("Receiver"),
        norm_version: payload.child_text("NormVersion"),
    }
}

fn read_metadata(payload: &Element) -> Result<Map<String, Value>, CodecError> {
    match payload.child("Metadata").map(element_to_value).transpose()? {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(CodecError::malformed(FORMAT, "Metadata must be a structure")),
    }
}

fn read_response(payload: &Element) -> Result<StandardResponse, CodecError> {
    let raw_status = payload
        .child_text("Status")
        .ok_or_else(|| CodecError::malformed(FORMAT, "response has no Status"))?;
    let status = ResponseStatus::parse(&raw_status)
        .ok_or_else(|| CodecError::malformed(FORMAT, format!("unknown status '{raw_status}'")))?;

    let errors = match payload.child("Errors") {
        Some(errors) => errors
            .children
            .iter()
            .map(read_error)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(StandardResponse {
        standard: NormStandard::BiproRclassic,
        header: read_header(payload),
        operation: payload.child_text("Operation"),
        status,
        data: payload.child("Data").map(element_to_value).transpose()?,
        errors,
        metadata: read_metadata(payload)?,
    })
}

fn error_element(error: &WireError) -> Element {
    let mut element = Element::new("Error")
        .with_child(Element::new("Code").with_text(error.code.as_str()))
        .with_child(Element::new("Message").with_text(error.message.as_str()))
        .with_child(Element::new("Severity").with_text(error.severity.as_str()));
    if let Some(field) = &error.field {
        element.push(Element::new("Field").with_text(field.as_str()));
    }
    element
}

fn read_error(element: &Element) -> Result<WireError, CodecError> {
    let severity = match element.child_text("Severity") {
        Some(raw) => Severity::parse(&raw)
            .ok_or_else(|| CodecError::malformed(FORMAT, format!("unknown severity '{raw}'")))?,
        None => Severity::Error,
    };
    Ok(WireError {
        code: element.child_text("Code").unwrap_or_default(),
        message: element.child_text("Message").unwrap_or_default(),
        severity,
        field: element.child_text("Field"),
    })
}

/// Keys that are not XML names are written as `<entry key="...">`.
fn is_xml_name(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.to_ascii_lowercase().starts_with("xml")
}

pub(crate) fn value_to_element(name: &str, value: &Value) -> Element {
    let element = if is_xml_name(name) {
        Element::new(name)
    } else {
        Element::new("entry").with_attr("key", name)
    };

    match value {
        Value::Null => element.with_attr("xsi:nil", "true"),
        Value::Bool(flag) => element
            .with_attr("xsi:type", "xsd:boolean")
            .with_text(flag.to_string()),
        Value::Number(number) => {
            let kind = if number.is_f64() { "xsd:decimal" } else { "xsd:long" };
            element.with_attr("xsi:type", kind).with_text(number.to_string())
        }
        Value::String(text) => element.with_text(text.as_str()),
        Value::Array(items) => {
            let mut element = element.with_attr("xsi:type", "soapenc:Array");
            for item in items {
                element.push(value_to_element("item", item));
            }
            element
        }
        Value::Object(map) => {
            let mut element = if map.is_empty() {
                element.with_attr("xsi:type", "soapenc:Struct")
            } else {
                element
            };
            for (key, child) in map {
                element.push(value_to_element(key, child));
            }
            element
        }
    }
}

pub(crate) fn element_to_value(element: &Element) -> Result<Value, CodecError> {
    if element.attr("nil") == Some("true") {
        return Ok(Value::Null);
    }

    let declared = element.attr("type").map(|kind| kind.rsplit(':').next().unwrap_or(kind));
    match declared {
        Some("Array") => element
            .children
            .iter()
            .map(element_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Some("Struct") => object_of(element),
        Some("boolean") => match element.text.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            other => Err(CodecError::malformed(
                FORMAT,
                format!("<{}> is not a boolean: '{other}'", element.name),
            )),
        },
        Some("long" | "int" | "integer" | "short") => parse_integer(element),
        Some("decimal" | "double" | "float") => {
            let text = element.text.trim();
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    CodecError::malformed(FORMAT, format!("<{}> is not a decimal: '{text}'", element.name))
                })
        }
        _ if !element.children.is_empty() => object_of(element),
        _ => Ok(Value::String(element.text.clone())),
    }
}

fn parse_integer(element: &Element) -> Result<Value, CodecError> {
    let text = element.text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Value::from(value));
    }
    text.parse::<u64>().map(Value::from).map_err(|_| {
        CodecError::malformed(FORMAT, format!("<{}> is not an integer: '{text}'", element.name))
    })
}

fn object_of(element: &Element) -> Result<Value, CodecError> {
    let mut map = Map::new();
    for child in &element.children {
        let key = if child.local_name() == "entry" {
            child.attr("key").unwrap_or("entry").to_string()
        } else {
            child.local_name().to_string()
        };
        map.insert(key, element_to_value(child)?);
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn request(data: Value, credentials: Option<Credentials>) -> StandardRequest {
        let mut metadata = Map::new();
        metadata.insert("documentId".to_string(), json!("DOC-1"));
        StandardRequest::Bipro(BiproRequest {
            flavour: BiproFlavour::RClassic,
            credentials,
            body: MessageBody {
                header: MessageHeader {
                    message_id: Some("MSG-1".to_string()),
                    timestamp: Some("2026-10-17T09:30:00Z".to_string()),
                    sender: Some("BROKER-7".to_string()),
                    receiver: Some("MOTOR-NORM".to_string()),
                    norm_version: Some("2024.1".to_string()),
                },
                operation: Some("tariff".to_string()),
                data,
                metadata,
            },
        })
    }

    fn token() -> Credentials {
        Credentials::UsernameToken(UsernameToken {
            username: "broker".to_string(),
            password: "s3cret".to_string(),
            created: Some("2026-10-17T09:30:00Z".to_string()),
            expires: Some("2026-10-17T09:35:00Z".to_string()),
        })
    }

    #[test]
    fn request_round_trips_with_typed_leaves() {
        let data = json!({
            "riskData": {
                "vehicleData": {
                    "make": "BMW",
                    "year": 2021,
                    "engineSize": 2.0,
                    "vehicleValue": 41500.5,
                    "securityFeatures": ["ALARMANLAGE", "ORTUNG"],
                    "modifications": [],
                    "extras": {}
                },
                "driverData": { "hasClaims": false, "occupation": null }
            },
            "free text key": "kept"
        });
        let original = request(data, Some(token()));
        let bytes = SoapCodec.encode_request(&original).expect("encodes");
        let text = String::from_utf8(bytes.clone()).expect("utf-8");
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<wsse:Username>broker</wsse:Username>"));
        assert!(text.contains(r#"<year xsi:type="xsd:long">2021</year>"#));
        assert!(text.contains(r#"<entry key="free text key">kept</entry>"#));

        let decoded = SoapCodec.decode_request(&bytes).expect("decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn bearer_credentials_never_reach_the_envelope() {
        let original = request(json!({}), Some(Credentials::Bearer("tok".to_string())));
        let bytes = SoapCodec.encode_request(&original).expect("encodes");
        let text = String::from_utf8(bytes).expect("utf-8");
        assert!(!text.contains("tok"));
        assert!(!text.contains("soap:Header"));
    }

    #[test]
    fn error_responses_become_faults_and_decode_back() {
        let response = StandardResponse {
            standard: NormStandard::BiproRclassic,
            header: MessageHeader {
                message_id: Some("MN-MSG-00000001".to_string()),
                norm_version: Some("2024.1".to_string()),
                ..MessageHeader::default()
            },
            operation: Some("tariff".to_string()),
            status: ResponseStatus::Error,
            data: None,
            errors: vec![WireError::error("REQUIRED", "riskData.vehicleData.make is required")
                .with_field("riskData.vehicleData.make")],
            metadata: Map::new(),
        };
        let bytes = SoapCodec.encode_response(&response).expect("encodes");
        let text = String::from_utf8(bytes.clone()).expect("utf-8");
        assert!(text.contains("<faultcode>soap:Client</faultcode>"));
        assert!(text.contains("<faultstring>riskData.vehicleData.make is required</faultstring>"));
        assert_eq!(SoapCodec.decode_response(&bytes).expect("decodes"), response);
    }

    #[test]
    fn foreign_faults_decode_to_a_single_error() {
        let fault = format!(
            r#"<soap:Envelope xmlns:soap="{SOAP_ENV_NS}"><soap:Body><soap:Fault>
               <faultcode>soap:Server</faultcode><faultstring>backend down</faultstring>
               </soap:Fault></soap:Body></soap:Envelope>"#
        );
        let response = SoapCodec.decode_response(fault.as_bytes()).expect("decodes");
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.errors[0].code, "soap:Server");
        assert_eq!(response.errors[0].message, "backend down");
    }

    #[test]
    fn malformed_envelopes_are_transport_errors() {
        let err = SoapCodec
            .decode_request(b"<soap:Envelope><soap:Body>")
            .expect_err("unclosed");
        assert!(matches!(err, CodecError::Malformed { .. }));

        let err = SoapCodec
            .decode_request(b"<Order><Body/></Order>")
            .expect_err("not an envelope");
        assert!(err.to_string().contains("soap:Envelope"));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(Value::from),
            "[A-Za-z0-9 äöüß.,-]{0,16}".prop_map(Value::String),
        ]
    }

    fn tree() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z][A-Za-z0-9]{0,8}", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn any_payload_tree_round_trips(data in tree()) {
            let original = request(data, None);
            let bytes = SoapCodec.encode_request(&original).expect("encodes");
            let decoded = SoapCodec.decode_request(&bytes).expect("decodes");
            prop_assert_eq!(decoded, original);
        }
    }
}
