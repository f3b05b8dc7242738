//! Server core functionality
//!
//! Listener, accept loop and the per-connection session loop.

pub mod core;
pub mod session;

pub use core::Server;
pub use session::handle_connection;
