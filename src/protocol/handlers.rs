//! Negotiation relay
//!
//! Interprets inbound envelopes against the presence registry and returns the
//! deliveries the transport must perform. Handlers keep no state of their own
//! beyond what the registry holds.

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::RelayConfig;
use crate::error::ProtocolError;
use crate::protocol::envelope::{Envelope, TO_ALL};
use crate::protocol::messages::{ConnectPayload, Delivery, InboundType, OutboundType};
use crate::protocol::parser::{decode_connect_payload, encode_connect_payload, key_from_message};
use crate::registry::{ConnectionId, PresenceRegistry};

/// Dispatches one inbound envelope from connection `conn`.
///
/// # Arguments
///
/// * `registry` - Presence registry, exclusively borrowed for the whole message.
/// * `conn` - Connection the envelope arrived on.
/// * `envelope` - Decoded inbound envelope.
///
/// # Returns
///
/// * `Ok(deliveries)` - Outbound envelopes and their destinations, possibly none.
/// * `Err(ProtocolError)` - The payload was unusable; nothing was changed.
pub fn handle_message(
    registry: &mut PresenceRegistry,
    conn: ConnectionId,
    envelope: &Envelope,
) -> Result<Vec<Delivery>, ProtocolError> {
    let from = envelope.from.as_str();
    let kind = envelope.kind.as_str();

    match InboundType::from(kind) {
        InboundType::Register => Ok(handle_register(registry, conn, from)),
        InboundType::Ping => Ok(handle_ping(conn, from, &envelope.message)),
        InboundType::UserUpdateRequest => Ok(handle_user_update_request(registry, conn, from)),
        InboundType::Connect => {
            let payload = decode_connect_payload(kind, &envelope.message)?;
            handle_connect(registry, conn, from, payload)
        }
        InboundType::ConnectRequestConfirmed => {
            let payload = decode_connect_payload(kind, &envelope.message)?;
            handle_connect_request_confirmed(registry, from, payload)
        }
        InboundType::ConnectRequestDeclined => {
            let partner = key_from_message(kind, &envelope.message)?;
            Ok(handle_connect_request_declined(registry, from, partner))
        }
        InboundType::Confirmed => {
            let partner = key_from_message(kind, &envelope.message)?;
            Ok(relay_signal(registry, partner, OutboundType::ConnectSuccess))
        }
        InboundType::StartChat => {
            let partner = key_from_message(kind, &envelope.message)?;
            Ok(relay_signal(registry, partner, OutboundType::StartChatRequest))
        }
        InboundType::Unknown(other) => {
            warn!("Unknown message type from {}: {}", from, other);
            Ok(Vec::new())
        }
    }
}

/// Cleans up after connection `conn` went away and announces the new
/// presence list to every remaining connection.
///
/// Runs for connections that never registered too; the broadcast then
/// carries the unchanged list.
pub fn handle_disconnect(
    registry: &mut PresenceRegistry,
    conn: ConnectionId,
    config: &RelayConfig,
) -> Vec<Delivery> {
    match registry.remove_by_connection(conn) {
        Some(key) => {
            info!("Client {} left (connection {})", key, conn);
            if config.clear_busy_on_disconnect {
                registry.set_busy(&key, false);
                if let Some(partner) = registry.take_partner(&key) {
                    debug!("Releasing {} after partner {} left", partner, key);
                    registry.set_busy(&partner, false);
                }
            }
        }
        None => debug!("Connection {} closed without a registered key", conn),
    }

    vec![Delivery::AllExcept(conn, presence_update(TO_ALL, registry.list_keys()))]
}

/// Binds the sender's key to this connection and broadcasts presence to all.
fn handle_register(registry: &mut PresenceRegistry, conn: ConnectionId, from: &str) -> Vec<Delivery> {
    if let Some(previous) = registry.bind(from, conn) {
        info!(
            "Client {} re-registered on connection {} (was {})",
            from, conn, previous
        );
    } else {
        info!("Client {} registered on connection {}", from, conn);
    }

    vec![Delivery::All(presence_update(TO_ALL, registry.list_keys()))]
}

/// Echoes the message back to the sender.
fn handle_ping(conn: ConnectionId, from: &str, message: &Value) -> Vec<Delivery> {
    vec![Delivery::To(
        conn,
        Envelope::from_server(from, OutboundType::PingAck, message.clone()),
    )]
}

/// Replies with every registered key except the sender's own.
fn handle_user_update_request(
    registry: &PresenceRegistry,
    conn: ConnectionId,
    from: &str,
) -> Vec<Delivery> {
    let keys: Vec<String> = registry
        .list_keys()
        .into_iter()
        .filter(|key| key != from)
        .collect();

    vec![Delivery::To(conn, presence_update(from, keys))]
}

/// Starts a negotiation unless the partner is already busy.
///
/// The busy check and both busy marks happen under the same registry borrow,
/// so two callers racing for one partner cannot both get through. An offline
/// partner is still marked busy; only the relay is skipped.
fn handle_connect(
    registry: &mut PresenceRegistry,
    conn: ConnectionId,
    from: &str,
    payload: ConnectPayload,
) -> Result<Vec<Delivery>, ProtocolError> {
    let partner = payload.partner_key.clone();

    if registry.is_busy(&partner) {
        debug!("{} asked for busy partner {}", from, partner);
        return Ok(vec![Delivery::To(
            conn,
            Envelope::from_server(from, OutboundType::LineBusy, Value::Null),
        )]);
    }

    registry.set_busy(from, true);
    registry.set_busy(&partner, true);
    registry.pair(from, &partner);

    relay_payload(registry, from, payload, OutboundType::ConnectRequest)
}

/// Forwards the answering side's description and candidates to the caller.
fn handle_connect_request_confirmed(
    registry: &PresenceRegistry,
    from: &str,
    payload: ConnectPayload,
) -> Result<Vec<Delivery>, ProtocolError> {
    relay_payload(registry, from, payload, OutboundType::ConfirmRequest)
}

/// Releases both parties and tells the named one the attempt failed.
fn handle_connect_request_declined(
    registry: &mut PresenceRegistry,
    from: &str,
    partner: &str,
) -> Vec<Delivery> {
    registry.set_busy(from, false);
    registry.set_busy(partner, false);
    registry.take_partner(from);

    relay_signal(registry, partner, OutboundType::ConnectFailure)
}

/// Re-addresses a connect payload to its partner, naming the sender as the
/// new partner key.
fn relay_payload(
    registry: &PresenceRegistry,
    from: &str,
    payload: ConnectPayload,
    kind: OutboundType,
) -> Result<Vec<Delivery>, ProtocolError> {
    let destination = payload.partner_key;
    let Some(target) = registry.lookup_connection(&destination) else {
        debug!("Dropping {} for offline client {}", kind.as_str(), destination);
        return Ok(Vec::new());
    };

    let message = encode_connect_payload(&ConnectPayload {
        partner_key: from.to_string(),
        description: payload.description,
        icecandidates: payload.icecandidates,
    })?;

    Ok(vec![Delivery::To(
        target,
        Envelope::from_server(destination, kind, message),
    )])
}

/// Sends a payload-less signal to the connection of `key`, if online.
fn relay_signal(registry: &PresenceRegistry, key: &str, kind: OutboundType) -> Vec<Delivery> {
    match registry.lookup_connection(key) {
        Some(target) => vec![Delivery::To(
            target,
            Envelope::from_server(key, kind, Value::Null),
        )],
        None => {
            debug!("Dropping {} for offline client {}", kind.as_str(), key);
            Vec::new()
        }
    }
}

fn presence_update(to: &str, keys: Vec<String>) -> Envelope {
    let keys = keys.into_iter().map(Value::String).collect();
    Envelope::from_server(to, OutboundType::UserUpdate, Value::Array(keys))
}
