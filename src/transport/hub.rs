//! Module `hub`
//!
//! Maps live connection ids to the outbound channel of their writer task.
//! Sending to an id that is gone is a silent no-op.

use log::debug;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::protocol::Delivery;
use crate::registry::ConnectionId;

/// Table of live connections.
#[derive(Default)]
pub struct ConnectionHub {
    connections: Mutex<HashMap<ConnectionId, UnboundedSender<String>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns the receiving end its writer drains.
    pub async fn add(&self, conn: ConnectionId) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();
        self.connections.lock().await.insert(conn, tx);
        rx
    }

    /// Removes a connection. Its writer stops once the channel drains.
    pub async fn remove(&self, conn: ConnectionId) -> bool {
        self.connections.lock().await.remove(&conn).is_some()
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn send_to(&self, conn: ConnectionId, line: &str) {
        let connections = self.connections.lock().await;
        match connections.get(&conn) {
            Some(tx) => {
                if tx.send(line.to_string()).is_err() {
                    debug!("Connection {} writer already closed", conn);
                }
            }
            None => debug!("Connection {} not found, dropping message", conn),
        }
    }

    pub async fn broadcast_all(&self, line: &str) {
        let connections = self.connections.lock().await;
        for tx in connections.values() {
            let _ = tx.send(line.to_string());
        }
    }

    pub async fn broadcast_except(&self, except: ConnectionId, line: &str) {
        let connections = self.connections.lock().await;
        for (conn, tx) in connections.iter() {
            if *conn != except {
                let _ = tx.send(line.to_string());
            }
        }
    }

    /// Performs one relay delivery.
    pub async fn deliver(&self, delivery: &Delivery) {
        let line = delivery.envelope().to_line();
        match delivery {
            Delivery::To(conn, _) => self.send_to(*conn, &line).await,
            Delivery::All(_) => self.broadcast_all(&line).await,
            Delivery::AllExcept(conn, _) => self.broadcast_except(*conn, &line).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Envelope, OutboundType};
    use serde_json::Value;

    fn line(kind: OutboundType) -> Envelope {
        Envelope::from_server("x", kind, Value::Null)
    }

    #[tokio::test]
    async fn addressed_delivery_reaches_only_target() {
        let hub = ConnectionHub::new();
        let mut one = hub.add(1).await;
        let mut two = hub.add(2).await;

        hub.deliver(&Delivery::To(2, line(OutboundType::LineBusy))).await;

        assert!(two.try_recv().unwrap().contains("line-busy"));
        assert!(one.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcasts_respect_exclusion() {
        let hub = ConnectionHub::new();
        let mut one = hub.add(1).await;
        let mut two = hub.add(2).await;

        hub.deliver(&Delivery::All(line(OutboundType::UserUpdate))).await;
        assert!(one.try_recv().is_ok());
        assert!(two.try_recv().is_ok());

        hub.deliver(&Delivery::AllExcept(1, line(OutboundType::UserUpdate)))
            .await;
        assert!(one.try_recv().is_err());
        assert!(two.try_recv().is_ok());
    }

    #[tokio::test]
    async fn sending_to_removed_connection_is_noop() {
        let hub = ConnectionHub::new();
        let rx = hub.add(1).await;
        drop(rx);

        hub.send_to(1, "closed writer").await;
        assert!(hub.remove(1).await);
        assert!(!hub.remove(1).await);
        hub.send_to(1, "unknown").await;
        assert_eq!(hub.len().await, 0);
    }
}
