//! Norm 440 deep links into a partner portal.

use crate::norms::{MessageHeader, ValidationCode, ValidationError};
use crate::runtime::{Clock, IdGenerator, IdKind};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const DEEPLINK_NORM_VERSION: &str = "440.2024.1";
pub const SESSION_MINUTES: i64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLinkRequest {
    #[serde(default)]
    pub message_header: MessageHeader,
    #[serde(default)]
    pub target_system: String,
    #[serde(default)]
    pub target_function: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub session_token: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLinkResponse {
    pub message_header: MessageHeader,
    pub access_url: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum DeepLinkError {
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("deep link base url '{0}' cannot carry path segments")]
    InvalidBase(String),
    #[error("malformed deep link request: {0}")]
    Malformed(String),
}

pub struct DeepLinkIssuer<C, G> {
    base: Url,
    sender_id: String,
    clock: Arc<C>,
    ids: Arc<G>,
}

impl<C, G> DeepLinkIssuer<C, G>
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    pub fn new(base: Url, sender_id: impl Into<String>, clock: Arc<C>, ids: Arc<G>) -> Self {
        Self {
            base,
            sender_id: sender_id.into(),
            clock,
            ids,
        }
    }

    pub fn issue(&self, request: &DeepLinkRequest) -> Result<DeepLinkResponse, DeepLinkError> {
        let errors = validate(request);
        if !errors.is_empty() {
            return Err(DeepLinkError::Validation(errors));
        }

        let access_url = self.access_url(request)?;
        let session_id = self.ids.next_id(IdKind::Session);
        let now = self.clock.now();
        info!(
            %session_id,
            target_system = request.target_system.trim(),
            target_function = request.target_function.trim(),
            "deep link issued"
        );

        Ok(DeepLinkResponse {
            message_header: MessageHeader {
                message_id: Some(self.ids.next_id(IdKind::Message)),
                timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
                sender: Some(self.sender_id.clone()),
                receiver: request.message_header.sender.clone(),
                norm_version: Some(DEEPLINK_NORM_VERSION.to_string()),
            },
            access_url: access_url.to_string(),
            session_id,
            expires_at: now + Duration::minutes(SESSION_MINUTES),
            status: "SUCCESS",
        })
    }

    /// `{base}/{system}/{function}` with the parameters as a sorted query.
    fn access_url(&self, request: &DeepLinkRequest) -> Result<Url, DeepLinkError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DeepLinkError::InvalidBase(self.base.to_string()))?
            .pop_if_empty()
            .push(request.target_system.trim())
            .push(request.target_function.trim());
        if !request.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(request.parameters.iter());
        }
        Ok(url)
    }
}

fn validate(request: &DeepLinkRequest) -> Vec<ValidationError> {
    let required = [
        ("targetSystem", &request.target_system),
        ("targetFunction", &request.target_function),
        ("sessionToken", &request.session_token),
        ("userId", &request.user_id),
    ];
    let mut errors: Vec<ValidationError> = required
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(path, _)| ValidationError::new(path, ValidationCode::Required, format!("{path} is required")))
        .collect();

    if let Some(key) = request.parameters.keys().find(|key| key.trim().is_empty()) {
        errors.push(ValidationError::new(
            format!("parameters[{key}]"),
            ValidationCode::InvalidPattern,
            "parameter names must not be blank",
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{FixedClock, SequenceIdGenerator};
    use crate::testing::clock;

    fn issuer(base: &str) -> DeepLinkIssuer<FixedClock, SequenceIdGenerator> {
        DeepLinkIssuer::new(
            Url::parse(base).expect("base"),
            "MOTOR-NORM",
            Arc::new(clock()),
            Arc::new(SequenceIdGenerator::new("T")),
        )
    }

    fn request() -> DeepLinkRequest {
        DeepLinkRequest {
            target_system: "policy-admin".to_string(),
            target_function: "contract view".to_string(),
            parameters: BTreeMap::from([
                ("policy".to_string(), "KFZ-1&2".to_string()),
                ("customer".to_string(), "C 42".to_string()),
            ]),
            session_token: "token".to_string(),
            user_id: "agent-7".to_string(),
            ..DeepLinkRequest::default()
        }
    }

    #[test]
    fn access_urls_are_encoded_with_sorted_parameters() {
        let response = issuer("https://portal.example.com/access/").issue(&request()).expect("link");
        assert_eq!(
            response.access_url,
            "https://portal.example.com/access/policy-admin/contract%20view?customer=C+42&policy=KFZ-1%262"
        );
    }

    #[test]
    fn sessions_expire_after_thirty_minutes() {
        let response = issuer("https://portal.example.com/access").issue(&request()).expect("link");
        assert_eq!(response.expires_at - clock().now(), Duration::minutes(30));
        assert_eq!(response.session_id, "T-SES-00000001");
        assert_eq!(response.message_header.norm_version.as_deref(), Some(DEEPLINK_NORM_VERSION));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let Err(DeepLinkError::Validation(errors)) = issuer("https://portal.example.com")
            .issue(&DeepLinkRequest::default())
        else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|error| error.field_path.as_str()).collect();
        assert_eq!(fields, ["targetSystem", "targetFunction", "sessionToken", "userId"]);
    }

    #[test]
    fn opaque_bases_are_rejected() {
        assert!(matches!(
            issuer("mailto:portal@example.com").issue(&request()),
            Err(DeepLinkError::InvalidBase(_))
        ));
    }
}
