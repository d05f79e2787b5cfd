//! Request pipeline: decode, validate, map, calculate, map back, encode.
//!
//! The orchestrator only sequences the stages and stamps envelopes; every
//! stage's logic lives in its own module.

mod pipeline;

pub use pipeline::{ComplianceOrchestrator, Exchange, InboundMessage};

use crate::codecs::soap::SERVER_FAULT_CODE;
use crate::codecs::CodecError;
use crate::error::CalculationError;
use crate::mapping::MappingError;
use crate::norms::{Operation, UnknownStandard, ValidationError, WireError};
use crate::outbound::OutboundError;
use axum::http::StatusCode;
use std::fmt;

/// Error code for transport failures in wire error lists.
pub const TRANSPORT_ERROR_CODE: &str = "TRANSPORT_ERROR";

/// Pipeline stages in the order a message passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Decoded,
    Validated,
    MappedIn,
    Calculated,
    MappedOut,
    Encoded,
    Sent,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Received,
        Stage::Decoded,
        Stage::Validated,
        Stage::MappedIn,
        Stage::Calculated,
        Stage::MappedOut,
        Stage::Encoded,
        Stage::Sent,
    ];

    /// Name of the step that produces this stage.
    pub fn step_name(self) -> &'static str {
        match self {
            Stage::Received => "receive",
            Stage::Decoded => "decode",
            Stage::Validated => "validate",
            Stage::MappedIn => "map_in",
            Stage::Calculated => "calculate",
            Stage::MappedOut => "map_out",
            Stage::Encoded => "encode",
            Stage::Sent => "send",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Decode, mapping and network failures. Reported as one descriptive error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Outbound(#[from] OutboundError),
    #[error(transparent)]
    UnknownStandard(#[from] UnknownStandard),
    #[error("{0} header is required")]
    MissingHeader(&'static str),
    #[error("operation '{operation}' is not carried by the interchange pipeline")]
    Unsupported { operation: Operation },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineFailure {
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Transport(TransportError),
    #[error(transparent)]
    Calculation(CalculationError),
}

impl PipelineFailure {
    pub fn category(&self) -> &'static str {
        match self {
            PipelineFailure::Validation(_) => "validation",
            PipelineFailure::Transport(_) => "transport",
            PipelineFailure::Calculation(_) => "calculation",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineFailure::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineFailure::Transport(_) => StatusCode::BAD_REQUEST,
            PipelineFailure::Calculation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation_errors(&self) -> Vec<ValidationError> {
        match self {
            PipelineFailure::Validation(errors) => errors.clone(),
            _ => Vec::new(),
        }
    }

    /// Error list for a response payload. Validation failures list every
    /// violation; the other categories collapse into a single entry.
    pub fn wire_errors(&self) -> Vec<WireError> {
        match self {
            PipelineFailure::Validation(errors) => errors.iter().map(ValidationError::to_wire).collect(),
            PipelineFailure::Transport(err) => vec![WireError::error(TRANSPORT_ERROR_CODE, err.to_string())],
            PipelineFailure::Calculation(err) => vec![WireError::error(SERVER_FAULT_CODE, err.to_string())],
        }
    }
}

impl From<TransportError> for PipelineFailure {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<CalculationError> for PipelineFailure {
    fn from(value: CalculationError) -> Self {
        Self::Calculation(value)
    }
}

/// First failure of a pipeline run, tagged with the stage it failed to reach.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {failure}")]
pub struct PipelineError {
    pub stage: Stage,
    pub failure: PipelineFailure,
}

impl PipelineError {
    pub fn new(stage: Stage, failure: impl Into<PipelineFailure>) -> Self {
        Self {
            stage,
            failure: failure.into(),
        }
    }
}

#[cfg(test)]
mod tests;
