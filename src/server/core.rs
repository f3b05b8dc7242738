use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::config::RelayConfig;
use crate::error::TransportError;
use crate::registry::{ConnectionId, PresenceRegistry};
use crate::server::session::handle_connection;
use crate::transport::ConnectionHub;

pub struct Server {
    registry: Arc<Mutex<PresenceRegistry>>,
    hub: Arc<ConnectionHub>,
    listener: TcpListener,
    config: Arc<RelayConfig>,
    next_id: AtomicU64,
}

impl Server {
    /// Binds the listener described by `config`. The registry starts empty.
    pub async fn bind(config: RelayConfig) -> Result<Self, TransportError> {
        let socket = config.listen_socket();

        let listener = TcpListener::bind(&socket)
            .await
            .map_err(|e| TransportError::Bind(socket.clone(), e))?;
        info!("Server bound to {}", socket);

        Ok(Self {
            registry: Arc::new(Mutex::new(PresenceRegistry::new())),
            hub: Arc::new(ConnectionHub::new()),
            listener,
            config: Arc::new(config),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting signaling relay on {} (max {} connections)",
            self.config.listen_socket(),
            self.config.max_connections
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn = self.next_connection_id();

                    if self.hub.len().await >= self.config.max_connections {
                        let refused = TransportError::ConnectionLimit(self.config.max_connections);
                        warn!("Refusing {} (connection {}): {}", addr, conn, refused);
                        drop(stream);
                        continue;
                    }

                    // Registered in the accept loop so the limit check stays exact
                    let outbound = self.hub.add(conn).await;
                    let registry = Arc::clone(&self.registry);
                    let hub = Arc::clone(&self.hub);
                    let config = Arc::clone(&self.config);

                    tokio::spawn(async move {
                        handle_connection(stream, addr, conn, outbound, registry, hub, config).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
