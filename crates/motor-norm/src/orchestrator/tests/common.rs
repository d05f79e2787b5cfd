use std::sync::Arc;

use serde_json::Value;

use crate::codecs::codec_for;
use crate::norms::{NormStandard, Operation, StandardResponse};
use crate::orchestrator::{ComplianceOrchestrator, InboundMessage};
use crate::runtime::{FixedClock, SequenceIdGenerator};
use crate::tables::SeverityTable;
use crate::testing::{clock, norm_config};

pub(super) type TestOrchestrator = ComplianceOrchestrator<FixedClock, SequenceIdGenerator>;

pub(super) const SENDER_ID: &str = "MOTOR-NORM";

pub(super) fn orchestrator() -> TestOrchestrator {
    ComplianceOrchestrator::new(
        norm_config(),
        Arc::new(SeverityTable::standard().expect("embedded table loads")),
        Arc::new(clock()),
        Arc::new(SequenceIdGenerator::new("T")),
    )
}

pub(super) fn inbound(standard: NormStandard, operation: Operation, payload: &[u8]) -> InboundMessage<'_> {
    InboundMessage {
        standard,
        operation,
        version: None,
        payload,
        credentials: None,
    }
}

/// Decodes an encoded reply the way the caller would.
pub(super) fn decode_reply(standard: NormStandard, payload: &[u8]) -> StandardResponse {
    codec_for(standard)
        .decode_response(payload)
        .expect("reply decodes in the caller's format")
}

pub(super) fn data(response: &StandardResponse) -> &Value {
    response.data.as_ref().expect("response carries data")
}

pub(super) fn error_fields(response: &StandardResponse) -> Vec<String> {
    response
        .errors
        .iter()
        .filter_map(|error| error.field.clone())
        .collect()
}
