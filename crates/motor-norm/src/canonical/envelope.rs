use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Routing metadata stamped on every request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub message_id: String,
    pub sender: String,
    pub receiver: String,
    /// Standard name and version, e.g. `BiPRO RNext RNext.2024.1`.
    pub norm_identifier: String,
    pub timestamp: DateTime<Utc>,
    /// Message id of the inbound request this envelope answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}
