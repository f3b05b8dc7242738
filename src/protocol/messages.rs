//! Module `messages`
//!
//! Message type names of the signaling protocol, the double-encoded
//! `connect` payload and the addressed deliveries produced by the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::envelope::Envelope;
use crate::registry::ConnectionId;

/// Message types a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundType {
    Register,
    Ping,
    UserUpdateRequest,
    Connect,
    ConnectRequestConfirmed,
    ConnectRequestDeclined,
    Confirmed,
    StartChat,
    Unknown(String),
}

impl From<&str> for InboundType {
    fn from(raw: &str) -> Self {
        match raw {
            "register" => InboundType::Register,
            "ping" => InboundType::Ping,
            "user-update-request" => InboundType::UserUpdateRequest,
            "connect" => InboundType::Connect,
            "connect-request-confirmed" => InboundType::ConnectRequestConfirmed,
            "connect-request-declined" => InboundType::ConnectRequestDeclined,
            "confirmed" => InboundType::Confirmed,
            "start-chat" => InboundType::StartChat,
            other => InboundType::Unknown(other.to_string()),
        }
    }
}

/// Message types the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundType {
    PingAck,
    UserUpdate,
    LineBusy,
    ConnectRequest,
    ConfirmRequest,
    ConnectFailure,
    ConnectSuccess,
    StartChatRequest,
}

impl OutboundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundType::PingAck => "ping-ack",
            OutboundType::UserUpdate => "user-update",
            OutboundType::LineBusy => "line-busy",
            OutboundType::ConnectRequest => "connect-request",
            OutboundType::ConfirmRequest => "confirm-request",
            OutboundType::ConnectFailure => "connect-failure",
            OutboundType::ConnectSuccess => "connect-success",
            OutboundType::StartChatRequest => "start-chat-request",
        }
    }
}

/// Payload of `connect` and `connect-request-confirmed`.
///
/// Travels as a JSON-encoded string inside the envelope's `message` field,
/// which existing clients depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectPayload {
    #[serde(rename = "partnerKey")]
    pub partner_key: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub description: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub icecandidates: Value,
}

/// An outbound envelope together with where it goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    To(ConnectionId, Envelope),
    All(Envelope),
    AllExcept(ConnectionId, Envelope),
}

impl Delivery {
    pub fn envelope(&self) -> &Envelope {
        match self {
            Delivery::To(_, envelope) => envelope,
            Delivery::All(envelope) => envelope,
            Delivery::AllExcept(_, envelope) => envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_types_parse() {
        assert_eq!(InboundType::from("register"), InboundType::Register);
        assert_eq!(
            InboundType::from("connect-request-declined"),
            InboundType::ConnectRequestDeclined
        );
        assert_eq!(InboundType::from("start-chat"), InboundType::StartChat);
        assert_eq!(
            InboundType::from("Register"),
            InboundType::Unknown("Register".into())
        );
    }

    #[test]
    fn outbound_type_names() {
        assert_eq!(OutboundType::UserUpdate.as_str(), "user-update");
        assert_eq!(OutboundType::StartChatRequest.as_str(), "start-chat-request");
    }
}
