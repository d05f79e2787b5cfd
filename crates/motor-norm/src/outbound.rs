//! Client mode: posting encoded messages to a remote standard endpoint.
//!
//! No retries happen here. Callers may repeat quote and reserve calls;
//! transfers must not be repeated.

use crate::codecs::{codec_for, soap::soap_action};
use crate::norms::{Credentials, NormStandard, Operation};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A request ready for the wire.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub standard: NormStandard,
    pub operation: Operation,
    pub message_id: String,
    pub payload: Vec<u8>,
    pub credentials: Option<Credentials>,
}

impl OutboundMessage {
    pub fn is_idempotent(&self) -> bool {
        self.operation.is_idempotent()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutboundError {
    #[error("remote endpoint did not answer within {0:?}")]
    Timeout(Duration),
    #[error("remote endpoint answered {status} without a payload")]
    Status { status: u16 },
    #[error("request to remote endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct NormClient {
    http: Client,
    timeout: Duration,
}

impl NormClient {
    pub fn new(timeout: Duration) -> Result<Self, OutboundError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts the payload and returns the raw reply. Error replies that carry a
    /// payload are returned as well; standards report faults in the body.
    pub async fn send(&self, endpoint: &Url, message: &OutboundMessage) -> Result<Vec<u8>, OutboundError> {
        let codec = codec_for(message.standard);
        let mut request = self
            .http
            .post(endpoint.clone())
            .header(CONTENT_TYPE.as_str(), codec.content_type())
            .body(message.payload.clone());

        if message.standard == NormStandard::BiproRclassic {
            request = request.header("SOAPAction", soap_action(message.operation.as_str()));
        }
        if let Some(Credentials::Bearer(token)) = &message.credentials {
            request = request.header(AUTHORIZATION.as_str(), format!("Bearer {token}"));
        }

        debug!(
            standard = %message.standard,
            operation = %message.operation,
            message_id = %message.message_id,
            "sending to remote endpoint"
        );
        let response = request.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        if !status.is_success() {
            warn!(standard = %message.standard, status = status.as_u16(), "remote endpoint rejected message");
            if body.is_empty() {
                return Err(OutboundError::Status {
                    status: status.as_u16(),
                });
            }
        }
        Ok(body.to_vec())
    }

    fn classify(&self, err: reqwest::Error) -> OutboundError {
        if err.is_timeout() {
            OutboundError::Timeout(self.timeout)
        } else {
            OutboundError::Http(err)
        }
    }
}
