//! Wire codecs: bytes in a standard's encoding to and from message structs.
//!
//! Every decode failure is a transport error; semantic problems are left to
//! the validators.

pub mod fixed_width;
pub mod json;
pub mod soap;
pub mod xml;

use crate::norms::{NormStandard, StandardRequest, StandardResponse};
use fixed_width::{FixedWidthError, GdvCodec};
use json::JsonCodec;
use soap::SoapCodec;

pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FIXED_WIDTH_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed {format} payload: {reason}")]
    Malformed { format: &'static str, reason: String },
    #[error("payload is not valid UTF-8")]
    Encoding,
    #[error("{codec} codec cannot carry a {found} message")]
    WrongStandard {
        codec: NormStandard,
        found: NormStandard,
    },
    #[error(transparent)]
    FixedWidth(#[from] FixedWidthError),
}

impl CodecError {
    pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            reason: reason.into(),
        }
    }
}

/// Symmetric encoder/decoder for one standard. Requests and responses both
/// round-trip so the same codec serves inbound and outbound traffic.
pub trait Codec: Send + Sync {
    fn standard(&self) -> NormStandard;
    fn content_type(&self) -> &'static str;
    fn decode_request(&self, bytes: &[u8]) -> Result<StandardRequest, CodecError>;
    fn encode_request(&self, request: &StandardRequest) -> Result<Vec<u8>, CodecError>;
    fn decode_response(&self, bytes: &[u8]) -> Result<StandardResponse, CodecError>;
    fn encode_response(&self, response: &StandardResponse) -> Result<Vec<u8>, CodecError>;
}

static RCLASSIC: SoapCodec = SoapCodec;
static RNEXT: JsonCodec = JsonCodec::new(NormStandard::BiproRnext);
static SIVI: JsonCodec = JsonCodec::new(NormStandard::SiviAfs);
static GDV: GdvCodec = GdvCodec;

pub fn codec_for(standard: NormStandard) -> &'static dyn Codec {
    match standard {
        NormStandard::BiproRclassic => &RCLASSIC,
        NormStandard::BiproRnext => &RNEXT,
        NormStandard::SiviAfs => &SIVI,
        NormStandard::Gdv => &GDV,
    }
}

pub(crate) fn utf8(bytes: &[u8]) -> Result<&str, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::Encoding)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

pub(crate) fn ensure_standard(codec: NormStandard, found: NormStandard) -> Result<(), CodecError> {
    if codec == found {
        Ok(())
    } else {
        Err(CodecError::WrongStandard { codec, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_standard_has_a_codec() {
        for standard in NormStandard::ALL {
            assert_eq!(codec_for(standard).standard(), standard);
        }
        assert_eq!(codec_for(NormStandard::BiproRclassic).content_type(), SOAP_CONTENT_TYPE);
        assert_eq!(codec_for(NormStandard::Gdv).content_type(), FIXED_WIDTH_CONTENT_TYPE);
    }

    #[test]
    fn invalid_utf8_is_a_transport_error() {
        let err = codec_for(NormStandard::SiviAfs)
            .decode_request(&[0xff, 0xfe, 0x00])
            .expect_err("not utf-8");
        assert!(matches!(err, CodecError::Encoding));
    }
}
