pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;
pub mod utils;

pub use registry::PresenceRegistry;
pub use server::Server;
