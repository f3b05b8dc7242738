//! Wire envelope shared by both directions
//!
//! Every message on the wire is `{from, to, type, message}`. Outbound
//! envelopes always come from `"server"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::messages::OutboundType;

/// Sender name on every outbound envelope
pub const SERVER_SENDER: &str = "server";

/// Destination name on broadcast envelopes
pub const TO_ALL: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Value,
}

impl Envelope {
    /// Builds an outbound envelope addressed to `to`
    pub fn from_server(to: impl Into<String>, kind: OutboundType, message: Value) -> Self {
        Self {
            from: SERVER_SENDER.to_string(),
            to: to.into(),
            kind: kind.as_str().to_string(),
            message,
        }
    }

    /// Serializes to a single wire line, without the trailing newline
    pub fn to_line(&self) -> String {
        // Serializing a String/Value-only struct cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
