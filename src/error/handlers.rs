//! Error handlers
//!
//! Logs errors according to how far they reach.

use crate::error::types::{RelayError, TransportError};
use log::{error, warn};

/// Log a relay error. Protocol and per-connection errors are warnings,
/// startup failures are errors.
pub fn handle_error(err: &RelayError) {
    if is_fatal(err) {
        error!("Relay error: {}", err);
    } else {
        warn!("Relay error: {}", err);
    }
}

/// Whether the error should stop the process
pub fn is_fatal(err: &RelayError) -> bool {
    match err {
        RelayError::Config(_) => true,
        RelayError::Transport(TransportError::Bind(..)) => true,
        RelayError::Transport(_) => false,
        RelayError::Protocol(_) => false,
    }
}
