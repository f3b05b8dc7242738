//! Envelope and payload decoding
//!
//! Turns wire lines into envelopes and unpacks the typed parts of `message`.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::envelope::Envelope;
use crate::protocol::messages::ConnectPayload;

/// Parses one wire line into an envelope.
pub fn parse_envelope(line: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::MalformedEnvelope)
}

/// Decodes the string-encoded `connect` payload carried in `message`.
pub fn decode_connect_payload(kind: &str, message: &Value) -> Result<ConnectPayload, ProtocolError> {
    let encoded = message
        .as_str()
        .ok_or_else(|| ProtocolError::ExpectedEncodedPayload {
            kind: kind.to_string(),
        })?;

    serde_json::from_str(encoded).map_err(|source| ProtocolError::MalformedPayload {
        kind: kind.to_string(),
        source,
    })
}

/// Encodes a payload back into the string form clients expect in `message`.
pub fn encode_connect_payload(payload: &ConnectPayload) -> Result<Value, ProtocolError> {
    serde_json::to_string(payload)
        .map(Value::String)
        .map_err(|source| ProtocolError::MalformedPayload {
            kind: "outbound".to_string(),
            source,
        })
}

/// Reads a client key out of `message`.
pub fn key_from_message<'a>(kind: &str, message: &'a Value) -> Result<&'a str, ProtocolError> {
    message.as_str().ok_or_else(|| ProtocolError::ExpectedKey {
        kind: kind.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_requires_from_and_type() {
        assert!(parse_envelope(r#"{"from":"a","type":"ping"}"#).is_ok());
        assert!(parse_envelope(r#"{"type":"ping"}"#).is_err());
        assert!(parse_envelope(r#"{"from":"a"}"#).is_err());
        assert!(parse_envelope("not json").is_err());
    }

    #[test]
    fn envelope_tolerates_crlf() {
        let envelope = parse_envelope("{\"from\":\"a\",\"type\":\"ping\"}\r\n").unwrap();
        assert_eq!(envelope.kind, "ping");
    }

    #[test]
    fn connect_payload_is_double_encoded() {
        let message = json!(r#"{"partnerKey":"b","description":"d1","icecandidates":"i1"}"#);
        let payload = decode_connect_payload("connect", &message).unwrap();
        assert_eq!(payload.partner_key, "b");
        assert_eq!(payload.description, json!("d1"));
        assert_eq!(payload.icecandidates, json!("i1"));

        let encoded = encode_connect_payload(&payload).unwrap();
        assert_eq!(
            encoded,
            json!(r#"{"partnerKey":"b","description":"d1","icecandidates":"i1"}"#)
        );
    }

    #[test]
    fn missing_payload_fields_are_left_out_when_reencoded() {
        let message = json!(r#"{"partnerKey":"b","description":"d1"}"#);
        let payload = decode_connect_payload("connect", &message).unwrap();
        assert_eq!(payload.icecandidates, Value::Null);

        let encoded = encode_connect_payload(&payload).unwrap();
        assert_eq!(encoded, json!(r#"{"partnerKey":"b","description":"d1"}"#));
    }

    #[test]
    fn structural_connect_payload_is_rejected() {
        let message = json!({"partnerKey": "b", "description": "d1", "icecandidates": "i1"});
        assert!(matches!(
            decode_connect_payload("connect", &message),
            Err(ProtocolError::ExpectedEncodedPayload { .. })
        ));
    }

    #[test]
    fn garbage_connect_payload_is_rejected() {
        let message = json!("{partnerKey: b");
        assert!(matches!(
            decode_connect_payload("connect", &message),
            Err(ProtocolError::MalformedPayload { .. })
        ));

        let message = json!(r#"{"description":"d1"}"#);
        assert!(decode_connect_payload("connect", &message).is_err());
    }

    #[test]
    fn key_must_be_a_string() {
        assert_eq!(key_from_message("confirmed", &json!("bob")).unwrap(), "bob");
        assert!(key_from_message("confirmed", &json!(null)).is_err());
        assert!(key_from_message("confirmed", &json!(7)).is_err());
    }
}
