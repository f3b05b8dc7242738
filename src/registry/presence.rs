//! Module `presence`
//!
//! Owns the bijection between client keys and connection ids, the busy set,
//! and the record of which keys were last paired by a `connect`.
//!
//! The registry itself is not synchronized. The server wraps it in a single
//! mutex and holds that lock for the whole handling of one message, so every
//! check-and-set below is atomic with respect to other connections.

use std::collections::{HashMap, HashSet};

use crate::registry::{ClientKey, ConnectionId};

/// Registry of online client keys.
///
/// `key_to_connection` and `connection_to_key` are exact inverses after every
/// public method returns, and `order` lists exactly the registered keys.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    key_to_connection: HashMap<ClientKey, ConnectionId>,
    connection_to_key: HashMap<ConnectionId, ClientKey>,
    order: Vec<ClientKey>,
    busy: HashSet<ClientKey>,
    partners: HashMap<ClientKey, ClientKey>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every structure.
    pub fn reset(&mut self) {
        self.key_to_connection.clear();
        self.connection_to_key.clear();
        self.order.clear();
        self.busy.clear();
        self.partners.clear();
    }

    /// Binds `key` to `conn`, last writer wins.
    ///
    /// Any key previously bound to `conn` is unbound, and any connection
    /// previously bound to `key` loses its entry. Returns that previous
    /// connection, if it differs from `conn`.
    pub fn bind(&mut self, key: &str, conn: ConnectionId) -> Option<ConnectionId> {
        if let Some(old_key) = self.connection_to_key.get(&conn) {
            if old_key != key {
                let old_key = old_key.clone();
                self.remove_by_key(&old_key);
            }
        }

        let previous = self.key_to_connection.insert(key.to_string(), conn);
        match previous {
            Some(old_conn) if old_conn != conn => {
                self.connection_to_key.remove(&old_conn);
            }
            Some(_) => {}
            None => self.order.push(key.to_string()),
        }
        self.connection_to_key.insert(conn, key.to_string());

        previous.filter(|old_conn| *old_conn != conn)
    }

    pub fn lookup_connection(&self, key: &str) -> Option<ConnectionId> {
        self.key_to_connection.get(key).copied()
    }

    pub fn lookup_key(&self, conn: ConnectionId) -> Option<&ClientKey> {
        self.connection_to_key.get(&conn)
    }

    /// Removes `key` and its connection from both maps.
    pub fn remove_by_key(&mut self, key: &str) -> Option<ConnectionId> {
        let conn = self.key_to_connection.remove(key)?;
        self.connection_to_key.remove(&conn);
        self.order.retain(|k| k != key);
        Some(conn)
    }

    /// Removes `conn` and its key from both maps. No-op for unknown ids.
    pub fn remove_by_connection(&mut self, conn: ConnectionId) -> Option<ClientKey> {
        let key = self.connection_to_key.remove(&conn)?;
        self.key_to_connection.remove(&key);
        self.order.retain(|k| *k != key);
        Some(key)
    }

    /// Snapshot of registered keys in registration order.
    pub fn list_keys(&self) -> Vec<ClientKey> {
        self.order.clone()
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.busy.contains(key)
    }

    pub fn set_busy(&mut self, key: &str, busy: bool) {
        if busy {
            self.busy.insert(key.to_string());
        } else {
            self.busy.remove(key);
        }
    }

    /// Records `a` and `b` as negotiation partners. Any earlier pairing of
    /// either key is dropped first.
    pub fn pair(&mut self, a: &str, b: &str) {
        self.take_partner(a);
        self.take_partner(b);
        self.partners.insert(a.to_string(), b.to_string());
        self.partners.insert(b.to_string(), a.to_string());
    }

    /// Removes the pairing of `key` in both directions, returning the partner.
    pub fn take_partner(&mut self, key: &str) -> Option<ClientKey> {
        let partner = self.partners.remove(key)?;
        if self.partners.get(&partner).is_some_and(|k| k == key) {
            self.partners.remove(&partner);
        }
        Some(partner)
    }

    pub fn len(&self) -> usize {
        self.key_to_connection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_connection.is_empty()
    }
}
