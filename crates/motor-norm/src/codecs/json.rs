use super::{ensure_standard, utf8, Codec, CodecError, JSON_CONTENT_TYPE};
use crate::norms::{
    BiproFlavour, BiproRequest, MessageBody, MessageHeader, NormStandard, ResponseStatus,
    SiviRequest, StandardRequest, StandardResponse, WireError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const FORMAT: &str = "JSON";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestEnvelope {
    message_header: MessageHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseEnvelope {
    message_header: MessageHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    errors: Vec<WireError>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// JSON envelopes shared by BiPRO RNext and SIVI. Bearer tokens stay in the
/// transport; the envelope never carries credentials.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    standard: NormStandard,
}

impl JsonCodec {
    pub const fn new(standard: NormStandard) -> Self {
        Self { standard }
    }
}

impl Codec for JsonCodec {
    fn standard(&self) -> NormStandard {
        self.standard
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<StandardRequest, CodecError> {
        let text = utf8(bytes)?;
        let envelope: RequestEnvelope = serde_json::from_str(text)
            .map_err(|err| CodecError::malformed(FORMAT, err.to_string()))?;
        let body = MessageBody {
            header: envelope.message_header,
            operation: envelope.operation,
            data: envelope.data,
            metadata: envelope.metadata,
        };

        match self.standard {
            NormStandard::SiviAfs => Ok(StandardRequest::Sivi(SiviRequest {
                credentials: None,
                body,
            })),
            NormStandard::BiproRnext => Ok(StandardRequest::Bipro(BiproRequest {
                flavour: BiproFlavour::RNext,
                credentials: None,
                body,
            })),
            other => Err(CodecError::malformed(
                FORMAT,
                format!("{other} messages are not JSON encoded"),
            )),
        }
    }

    fn encode_request(&self, request: &StandardRequest) -> Result<Vec<u8>, CodecError> {
        ensure_standard(self.standard, request.standard())?;
        let body = match request {
            StandardRequest::Bipro(request) => &request.body,
            StandardRequest::Sivi(request) => &request.body,
            StandardRequest::Legacy(_) => {
                return Err(CodecError::WrongStandard {
                    codec: self.standard,
                    found: NormStandard::Gdv,
                })
            }
        };
        let envelope = RequestEnvelope {
            message_header: body.header.clone(),
            operation: body.operation.clone(),
            data: body.data.clone(),
            metadata: body.metadata.clone(),
        };
        serde_json::to_vec(&envelope).map_err(|err| CodecError::malformed(FORMAT, err.to_string()))
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<StandardResponse, CodecError> {
        let text = utf8(bytes)?;
        let envelope: ResponseEnvelope = serde_json::from_str(text)
            .map_err(|err| CodecError::malformed(FORMAT, err.to_string()))?;
        Ok(StandardResponse {
            standard: self.standard,
            header: envelope.message_header,
            operation: envelope.operation,
            status: envelope.status,
            data: envelope.data,
            errors: envelope.errors,
            metadata: envelope.metadata,
        })
    }

    fn encode_response(&self, response: &StandardResponse) -> Result<Vec<u8>, CodecError> {
        ensure_standard(self.standard, response.standard)?;
        let envelope = ResponseEnvelope {
            message_header: response.header.clone(),
            operation: response.operation.clone(),
            status: response.status,
            data: response.wire_data().cloned(),
            errors: response.errors.clone(),
            metadata: response.metadata.clone(),
        };
        serde_json::to_vec(&envelope).map_err(|err| CodecError::malformed(FORMAT, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norms::Credentials;
    use serde_json::json;

    const SIVI: JsonCodec = JsonCodec::new(NormStandard::SiviAfs);
    const RNEXT: JsonCodec = JsonCodec::new(NormStandard::BiproRnext);

    #[test]
    fn decodes_the_request_envelope() {
        let payload = json!({
            "messageHeader": {
                "messageId": "SIVI-42",
                "sender": "NL-BROKER",
                "normVersion": "2024.1"
            },
            "operation": "tariff",
            "data": { "vehicle": { "vehicleDetails": { "make": "Volvo" } } },
            "metadata": { "channel": "portal" }
        });
        let request = SIVI
            .decode_request(payload.to_string().as_bytes())
            .expect("decodes");

        assert_eq!(request.standard(), NormStandard::SiviAfs);
        assert_eq!(request.header().message_id.as_deref(), Some("SIVI-42"));
        assert_eq!(request.operation(), Some("tariff"));
        assert_eq!(
            request.data_tree()["vehicle"]["vehicleDetails"]["make"],
            json!("Volvo")
        );
    }

    #[test]
    fn request_round_trips_without_credentials_in_the_payload() {
        let mut request = RNEXT
            .decode_request(br#"{"messageHeader":{"messageId":"R-1"},"data":{"a":[1,2.5,"x"]}}"#)
            .expect("decodes");
        request.attach_credentials(Credentials::Bearer("secret-token".to_string()));

        let bytes = RNEXT.encode_request(&request).expect("encodes");
        assert!(!String::from_utf8_lossy(&bytes).contains("secret-token"));

        let decoded = RNEXT.decode_request(&bytes).expect("decodes again");
        assert_eq!(decoded.header(), request.header());
        assert_eq!(decoded.data_tree(), request.data_tree());
        assert!(decoded.credentials().is_none());
    }

    #[test]
    fn response_round_trips_with_errors() {
        let response = StandardResponse {
            standard: NormStandard::BiproRnext,
            header: MessageHeader {
                message_id: Some("MN-MSG-00000009".to_string()),
                receiver: Some("BROKER".to_string()),
                ..MessageHeader::default()
            },
            operation: Some("reserve".to_string()),
            status: ResponseStatus::Error,
            data: None,
            errors: vec![WireError::error("TRANSPORT_ERROR", "missing claimData.lossType")],
            metadata: Map::new(),
        };
        let bytes = RNEXT.encode_response(&response).expect("encodes");
        let text = String::from_utf8(bytes.clone()).expect("utf-8");
        assert!(text.contains(r#""status":"ERROR""#));
        assert!(!text.contains(r#""data""#));
        assert_eq!(RNEXT.decode_response(&bytes).expect("decodes"), response);
    }

    #[test]
    fn null_data_is_left_off_the_wire() {
        let response = StandardResponse {
            standard: NormStandard::SiviAfs,
            header: MessageHeader::default(),
            operation: Some("offerte".to_string()),
            status: ResponseStatus::Success,
            data: Some(Value::Null),
            errors: Vec::new(),
            metadata: Map::new(),
        };
        let bytes = SIVI.encode_response(&response).expect("encodes");
        let text = String::from_utf8(bytes.clone()).expect("utf-8");
        assert!(!text.contains(r#""data""#), "{text}");

        let decoded = SIVI.decode_response(&bytes).expect("decodes");
        assert_eq!(decoded.data, None);
        assert_eq!(SIVI.encode_response(&decoded).expect("re-encodes"), bytes);
    }

    #[test]
    fn rejects_foreign_standards_and_bad_json() {
        let sivi_response = StandardResponse {
            standard: NormStandard::SiviAfs,
            header: MessageHeader::default(),
            operation: None,
            status: ResponseStatus::Success,
            data: Some(json!({})),
            errors: Vec::new(),
            metadata: Map::new(),
        };
        assert!(matches!(
            RNEXT.encode_response(&sivi_response),
            Err(CodecError::WrongStandard { .. })
        ));
        assert!(matches!(
            SIVI.decode_request(b"{\"data\": "),
            Err(CodecError::Malformed { .. })
        ));
    }
}
