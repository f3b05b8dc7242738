use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::RelayConfig;
use crate::error::handlers::handle_error;
use crate::error::{ProtocolError, RelayError};
use crate::protocol::{handle_disconnect, handle_message, parse_envelope};
use crate::registry::{ConnectionId, PresenceRegistry};
use crate::transport::{ConnectionHub, read_frame};

/// Runs one client connection until it closes.
///
/// - Spawns a writer task draining `outbound` onto the socket, one envelope per line.
/// - Reads envelope lines through `read_frame` and dispatches them through
///   `handle_message`. Oversize or non-UTF-8 lines are logged and skipped.
/// - Holds the registry lock for the whole of each message, including its
///   deliveries, so broadcasts go out in the order the registry changed.
/// - On EOF or an I/O error, unregisters the connection and broadcasts presence.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn: ConnectionId,
    outbound: UnboundedReceiver<String>,
    registry: Arc<Mutex<PresenceRegistry>>,
    hub: Arc<ConnectionHub>,
    config: Arc<RelayConfig>,
) {
    info!("Connection {} opened from {}", conn, peer);

    let (read_half, write_half) = stream.into_split();
    tokio::spawn(write_lines(write_half, outbound, conn));

    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();

    loop {
        match read_frame(&mut reader, &mut buf, config.max_message_length).await {
            Ok(None) => {
                info!("Connection {} closed by peer {}", conn, peer);
                break;
            }
            Ok(Some(Ok(line))) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if let Err(e) = dispatch(trimmed, conn, &registry, &hub).await {
                    handle_error(&RelayError::from(e));
                }
            }
            Ok(Some(Err(e))) => {
                // Bad framing drops the line, never the connection
                handle_error(&RelayError::from(e));
            }
            Err(e) => {
                warn!("Failed to read from connection {} ({}): {}", conn, peer, e);
                break;
            }
        }
    }

    hub.remove(conn).await;

    let mut registry = registry.lock().await;
    for delivery in &handle_disconnect(&mut registry, conn, &config) {
        hub.deliver(delivery).await;
    }
    drop(registry);

    info!("Connection {} disconnected", conn);
}

async fn dispatch(
    line: &str,
    conn: ConnectionId,
    registry: &Mutex<PresenceRegistry>,
    hub: &ConnectionHub,
) -> Result<(), ProtocolError> {
    let envelope = parse_envelope(line)?;

    let mut registry = registry.lock().await;
    debug!(
        "Received {} from {} on connection {} (registered as {:?})",
        envelope.kind,
        envelope.from,
        conn,
        registry.lookup_key(conn)
    );
    for delivery in &handle_message(&mut registry, conn, &envelope)? {
        hub.deliver(delivery).await;
    }
    Ok(())
}

async fn write_lines(
    mut write_half: OwnedWriteHalf,
    mut outbound: UnboundedReceiver<String>,
    conn: ConnectionId,
) {
    while let Some(mut line) = outbound.recv().await {
        line.push('\n');
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            debug!("Write to connection {} failed: {}", conn, e);
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
