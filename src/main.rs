//! signal-relay - Entry Point
//!
//! Key-addressed signaling relay for brokering peer-to-peer call setup.

use log::info;

use signal_relay::Server;
use signal_relay::config::RelayConfig;
use signal_relay::error::RelayError;
use signal_relay::error::handlers::handle_error;
use signal_relay::utils::logging::setup_logging;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    // RUST_LOG overrides the default `info` filter
    setup_logging();

    info!("Launching signaling relay...");

    if let Err(e) = run().await {
        handle_error(&e);
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<(), RelayError> {
    let config = RelayConfig::load()?;
    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
