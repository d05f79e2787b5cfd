use super::{PipelineError, PipelineFailure, Stage, TransportError};
use crate::canonical::{ClaimNotification, MessageEnvelope, PremiumQuote, QuoteRequest, QuoteStatus};
use crate::codecs::codec_for;
use crate::config::NormConfig;
use crate::error::CalculationError;
use crate::mapping::{self, MappingError};
use crate::norms::{
    validator_for, Credentials, MessageBody, MessageHeader, NormStandard, Operation,
    ResponseStatus, StandardRequest, StandardResponse, ValidationContext, WireError,
};
use crate::outbound::{NormClient, OutboundMessage};
use crate::rating::{referral, RatingEngine};
use crate::reserve::{open_claims_exposure, ReserveEngine};
use crate::runtime::{Clock, IdGenerator, IdKind};
use crate::tables::{Market, RatingTables, SeverityTable};
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Raw inbound message plus what the transport told us about it.
#[derive(Debug, Clone)]
pub struct InboundMessage<'a> {
    pub standard: NormStandard,
    pub operation: Operation,
    /// Version from a transport header; wins over the version in the message.
    pub version: Option<&'a str>,
    pub payload: &'a [u8],
    pub credentials: Option<Credentials>,
}

/// Encoded reply for the caller, successful or not.
#[derive(Debug)]
pub struct Exchange {
    pub content_type: &'static str,
    pub payload: Vec<u8>,
    pub response: StandardResponse,
    pub failure: Option<PipelineError>,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

struct Failed {
    error: PipelineError,
    request: Option<MessageHeader>,
    version: String,
}

pub struct ComplianceOrchestrator<C, G> {
    clock: Arc<C>,
    ids: Arc<G>,
    german: RatingEngine,
    dutch: RatingEngine,
    reserve: ReserveEngine,
    config: NormConfig,
}

impl<C, G> ComplianceOrchestrator<C, G>
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    pub fn new(config: NormConfig, severity: Arc<SeverityTable>, clock: Arc<C>, ids: Arc<G>) -> Self {
        let validity = config.quote_validity_days;
        Self {
            clock,
            ids,
            german: RatingEngine::new(RatingTables::for_market(Market::Germany).with_validity_days(validity)),
            dutch: RatingEngine::new(RatingTables::for_market(Market::Netherlands).with_validity_days(validity)),
            reserve: ReserveEngine::new(severity),
            config,
        }
    }

    pub fn config(&self) -> &NormConfig {
        &self.config
    }

    /// Runs the pipeline and renders the outcome in the caller's wire format.
    /// Only fails when not even an error response can be encoded.
    pub fn handle(&self, message: InboundMessage<'_>) -> Result<Exchange, PipelineError> {
        let codec = codec_for(message.standard);
        match self.run(&message) {
            Ok((response, payload)) => Ok(Exchange {
                content_type: codec.content_type(),
                payload,
                response,
                failure: None,
            }),
            Err(failed) => {
                let response = self.error_response(&message, &failed);
                match codec.encode_response(&response) {
                    Ok(payload) => Ok(Exchange {
                        content_type: codec.content_type(),
                        payload,
                        response,
                        failure: Some(failed.error),
                    }),
                    Err(err) => {
                        warn!(standard = %message.standard, error = %err, "error response could not be encoded");
                        Err(failed.error)
                    }
                }
            }
        }
    }

    /// Runs the pipeline, returning the response before encoding errors into it.
    pub fn process(&self, message: InboundMessage<'_>) -> Result<StandardResponse, PipelineError> {
        self.run(&message)
            .map(|(response, _)| response)
            .map_err(|failed| failed.error)
    }

    fn run(&self, message: &InboundMessage<'_>) -> Result<(StandardResponse, Vec<u8>), Failed> {
        let standard = message.standard;
        let operation = message.operation;
        debug!(%standard, %operation, bytes = message.payload.len(), "received");

        let codec = codec_for(standard);
        let mut request = codec.decode_request(message.payload).map_err(|err| Failed {
            error: self.failure(standard, Stage::Decoded, TransportError::Codec(err).into()),
            request: None,
            version: String::new(),
        })?;
        if let Some(credentials) = message.credentials.clone() {
            request.attach_credentials(credentials);
        }
        debug!(%standard, stage = %Stage::Decoded, "stage reached");

        let header = request.header().clone();
        let version = message
            .version
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .or(header.norm_version.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();
        let fail = |error: PipelineError| Failed {
            error,
            request: Some(header.clone()),
            version: version.clone(),
        };

        let context = ValidationContext {
            operation,
            today: self.clock.today(),
        };
        let errors = validator_for(standard).validate(&request, &version, &context);
        if !errors.is_empty() {
            return Err(fail(self.failure(standard, Stage::Validated, PipelineFailure::Validation(errors))));
        }
        debug!(%standard, stage = %Stage::Validated, "stage reached");

        let tree = request.data_tree();
        let (data, extensions) = self.evaluate(standard, operation, &tree).map_err(fail)?;

        let envelope = self.envelope(standard, &version, Some(&header));
        let message_id = envelope.message_id.clone();
        let response = respond(
            standard,
            operation,
            envelope,
            &version,
            ResponseStatus::Success,
            Some(data),
            Vec::new(),
            extensions,
        );
        let payload = codec.encode_response(&response).map_err(|err| {
            fail(self.failure(standard, Stage::Encoded, TransportError::Codec(err).into()))
        })?;
        debug!(%standard, stage = %Stage::Encoded, "stage reached");

        info!(%message_id, %standard, %operation, "message processed");
        Ok((response, payload))
    }

    /// Map in, calculate, map out. Returns the wire result and the extension
    /// bag collected on the way in.
    fn evaluate(
        &self,
        standard: NormStandard,
        operation: Operation,
        tree: &Value,
    ) -> Result<(Value, Map<String, Value>), PipelineError> {
        let family = standard.family();
        let mapped_in = |err: MappingError| self.failure(standard, Stage::MappedIn, TransportError::Mapping(err).into());
        let mapped_out = |err: MappingError| self.failure(standard, Stage::MappedOut, TransportError::Mapping(err).into());
        let calculated = |err: CalculationError| self.failure(standard, Stage::Calculated, err.into());

        match operation {
            Operation::Tariff => {
                let request = mapping::quote_request(family, tree).map_err(mapped_in)?;
                debug!(%standard, stage = %Stage::MappedIn, "stage reached");
                let quote = self.quote(standard, &request.value).map_err(calculated)?;
                debug!(%standard, stage = %Stage::Calculated, "stage reached");
                let wire = mapping::quote_result(family, &quote).map_err(mapped_out)?;
                debug!(%standard, stage = %Stage::MappedOut, "stage reached");
                Ok((wire, request.extensions))
            }
            Operation::Reserve => {
                let claim = mapping::claim_notification(family, tree).map_err(mapped_in)?;
                debug!(%standard, stage = %Stage::MappedIn, "stage reached");
                let assessment = self.reserve.assess(&claim.value).map_err(calculated)?;
                debug!(%standard, stage = %Stage::Calculated, "stage reached");
                let wire = mapping::reserve_result(family, &assessment).map_err(mapped_out)?;
                debug!(%standard, stage = %Stage::MappedOut, "stage reached");
                Ok((wire, claim.extensions))
            }
            Operation::Transfer => Err(self.failure(
                standard,
                Stage::MappedIn,
                TransportError::Unsupported { operation }.into(),
            )),
        }
    }

    /// Quote from the market's tables. Unsettled claims in the history are
    /// valued through the reserve engine and referred to underwriting.
    pub fn quote(&self, standard: NormStandard, request: &QuoteRequest) -> Result<PremiumQuote, CalculationError> {
        let engine = match standard.market() {
            Market::Germany => &self.german,
            Market::Netherlands => &self.dutch,
        };
        let mut quote = engine.quote(&request.risk, &request.coverage, self.clock.as_ref())?;

        let exposure = open_claims_exposure(&self.reserve, &request.risk)?;
        if !exposure.is_empty() {
            let held: f64 = exposure.iter().map(|estimate| estimate.final_amount).sum();
            quote.referrals.push(referral(
                "OPEN_CLAIMS",
                format!("{} unsettled claim(s) with {held:.2} held in reserve", exposure.len()),
                "claims",
            ));
            quote.status = QuoteStatus::Referred;
        }
        Ok(quote)
    }

    /// Encodes a quote request for a remote endpoint of `standard`.
    pub fn compose_quote(
        &self,
        standard: NormStandard,
        request: &QuoteRequest,
        receiver: &str,
        credentials: Option<Credentials>,
    ) -> Result<OutboundMessage, PipelineError> {
        let data = mapping::quote_request_to_wire(standard.family(), request);
        self.compose(standard, Operation::Tariff, data, receiver, credentials)
    }

    /// Encodes a claim notification for a remote endpoint of `standard`.
    pub fn compose_claim(
        &self,
        standard: NormStandard,
        claim: &ClaimNotification,
        receiver: &str,
        credentials: Option<Credentials>,
    ) -> Result<OutboundMessage, PipelineError> {
        let data = mapping::claim_to_wire(standard.family(), claim);
        self.compose(standard, Operation::Reserve, data, receiver, credentials)
    }

    fn compose(
        &self,
        standard: NormStandard,
        operation: Operation,
        data: Result<Value, MappingError>,
        receiver: &str,
        credentials: Option<Credentials>,
    ) -> Result<OutboundMessage, PipelineError> {
        let data = data.map_err(|err| self.failure(standard, Stage::MappedOut, TransportError::Mapping(err).into()))?;
        let envelope = self.envelope(standard, standard.current_version(), None);
        let body = MessageBody {
            header: MessageHeader {
                receiver: Some(receiver.to_string()).filter(|receiver| !receiver.is_empty()),
                ..header_from(&envelope, standard.current_version())
            },
            operation: Some(operation.as_str().to_string()),
            data,
            metadata: Map::new(),
        };
        let encoded = StandardRequest::compose(standard, body, credentials.clone())
            .map_err(|err| TransportError::Codec(err.into()))
            .and_then(|request| codec_for(standard).encode_request(&request).map_err(TransportError::Codec))
            .map_err(|err| self.failure(standard, Stage::Encoded, err.into()))?;

        Ok(OutboundMessage {
            standard,
            operation,
            message_id: envelope.message_id,
            payload: encoded,
            credentials,
        })
    }

    /// Sends a composed message and decodes the remote reply.
    pub async fn dispatch(
        &self,
        client: &NormClient,
        endpoint: &Url,
        message: &OutboundMessage,
    ) -> Result<StandardResponse, PipelineError> {
        let standard = message.standard;
        let reply = client
            .send(endpoint, message)
            .await
            .map_err(|err| self.failure(standard, Stage::Sent, TransportError::Outbound(err).into()))?;
        debug!(%standard, message_id = %message.message_id, stage = %Stage::Sent, "stage reached");
        codec_for(standard)
            .decode_response(&reply)
            .map_err(|err| self.failure(standard, Stage::Decoded, TransportError::Codec(err).into()))
    }

    fn failure(&self, standard: NormStandard, stage: Stage, failure: PipelineFailure) -> PipelineError {
        warn!(%standard, stage = %stage, category = failure.category(), "pipeline stage failed");
        PipelineError::new(stage, failure)
    }

    fn envelope(&self, standard: NormStandard, version: &str, request: Option<&MessageHeader>) -> MessageEnvelope {
        MessageEnvelope {
            message_id: self.ids.next_id(IdKind::Message),
            sender: self.config.sender_id.clone(),
            receiver: request
                .and_then(|header| header.sender.clone())
                .unwrap_or_default(),
            norm_identifier: format!("{} {}", standard.display_name(), version),
            timestamp: self.clock.now(),
            correlation_id: request.and_then(|header| header.message_id.clone()),
        }
    }

    fn error_response(&self, message: &InboundMessage<'_>, failed: &Failed) -> StandardResponse {
        let version = if message.standard.supports_version(&failed.version) {
            failed.version.as_str()
        } else {
            message.standard.current_version()
        };
        let envelope = self.envelope(message.standard, version, failed.request.as_ref());
        let mut response = respond(
            message.standard,
            message.operation,
            envelope,
            version,
            ResponseStatus::Error,
            None,
            failed.error.failure.wire_errors(),
            Map::new(),
        );
        response
            .metadata
            .insert("failedStage".to_string(), Value::from(failed.error.stage.step_name()));
        response
    }
}

fn header_from(envelope: &MessageEnvelope, version: &str) -> MessageHeader {
    MessageHeader {
        message_id: Some(envelope.message_id.clone()),
        timestamp: Some(envelope.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        sender: Some(envelope.sender.clone()),
        receiver: Some(envelope.receiver.clone()).filter(|receiver| !receiver.is_empty()),
        norm_version: Some(version.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn respond(
    standard: NormStandard,
    operation: Operation,
    envelope: MessageEnvelope,
    version: &str,
    status: ResponseStatus,
    data: Option<Value>,
    errors: Vec<WireError>,
    extensions: Map<String, Value>,
) -> StandardResponse {
    let mut metadata = Map::new();
    if let Some(correlation) = &envelope.correlation_id {
        metadata.insert("correlationId".to_string(), Value::from(correlation.clone()));
    }
    metadata.insert("normIdentifier".to_string(), Value::from(envelope.norm_identifier.clone()));
    if !extensions.is_empty() {
        metadata.insert("extensions".to_string(), Value::Object(extensions));
    }

    StandardResponse {
        standard,
        header: header_from(&envelope, version),
        operation: Some(operation.as_str().to_string()),
        status,
        data: data.filter(|data| !data.is_null()),
        errors,
        metadata,
    }
}
