//! Error types
//!
//! Defines error types for the protocol, transport and startup layers of the relay.

use std::fmt;
use std::io;

/// Wire protocol errors. All of these are recoverable: the offending message
/// is dropped and the connection stays open.
#[derive(Debug)]
pub enum ProtocolError {
    /// The line is not a JSON envelope with `from` and `type`
    MalformedEnvelope(serde_json::Error),
    /// A `connect`-style payload could not be decoded
    MalformedPayload {
        kind: String,
        source: serde_json::Error,
    },
    /// The payload was expected to be an encoded string
    ExpectedEncodedPayload { kind: String },
    /// The `message` field was expected to name a client key
    ExpectedKey { kind: String },
    MessageTooLong { len: usize, max: usize },
    /// The line is not valid UTF-8
    InvalidEncoding(std::string::FromUtf8Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedEnvelope(e) => write!(f, "Malformed envelope: {}", e),
            ProtocolError::MalformedPayload { kind, source } => {
                write!(f, "Malformed {} payload: {}", kind, source)
            }
            ProtocolError::ExpectedEncodedPayload { kind } => {
                write!(f, "Expected encoded string payload for {}", kind)
            }
            ProtocolError::ExpectedKey { kind } => {
                write!(f, "Expected client key in message of {}", kind)
            }
            ProtocolError::MessageTooLong { len, max } => {
                write!(f, "Message of {} bytes exceeds limit of {}", len, max)
            }
            ProtocolError::InvalidEncoding(e) => write!(f, "Invalid UTF-8 in message: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::MalformedEnvelope(e) => Some(e),
            ProtocolError::MalformedPayload { source, .. } => Some(source),
            ProtocolError::InvalidEncoding(e) => Some(e),
            _ => None,
        }
    }
}

/// Transport errors
#[derive(Debug)]
pub enum TransportError {
    Bind(String, io::Error),
    Io(io::Error),
    ConnectionLimit(usize),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
            TransportError::ConnectionLimit(max) => {
                write!(f, "Connection limit of {} reached", max)
            }
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error)
    }
}

/// Top-level relay error
#[derive(Debug)]
pub enum RelayError {
    Protocol(ProtocolError),
    Transport(TransportError),
    Config(config::ConfigError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Protocol(e) => write!(f, "Protocol error: {}", e),
            RelayError::Transport(e) => write!(f, "Transport error: {}", e),
            RelayError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<ProtocolError> for RelayError {
    fn from(error: ProtocolError) -> Self {
        RelayError::Protocol(error)
    }
}

impl From<TransportError> for RelayError {
    fn from(error: TransportError) -> Self {
        RelayError::Transport(error)
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(error: config::ConfigError) -> Self {
        RelayError::Config(error)
    }
}

impl From<io::Error> for RelayError {
    fn from(error: io::Error) -> Self {
        RelayError::Transport(TransportError::Io(error))
    }
}
