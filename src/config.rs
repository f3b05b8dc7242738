//! Configuration management for the signaling relay
//!
//! Values come from built-in defaults, an optional `config.toml` in the
//! working directory, and `SIGNAL_RELAY_*` environment overrides, in that order.

use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_PATH: &str = "config";
const ENV_PREFIX: &str = "SIGNAL_RELAY";

/// Relay configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelayConfig {
    /// IP address the listener binds to
    /// Environment: SIGNAL_RELAY_BIND_ADDRESS
    pub bind_address: String,

    /// Listener port, 0 picks an ephemeral port
    /// Environment: SIGNAL_RELAY_PORT
    pub port: u16,

    /// Maximum concurrent transport connections
    pub max_connections: usize,

    /// Maximum size in bytes of one inbound envelope line
    pub max_message_length: usize,

    /// When set, a disconnect also clears the busy flag of the departed key
    /// and of the partner it was last paired with. Off by default, which
    /// leaves a partner dropped mid-negotiation marked busy.
    pub clear_busy_on_disconnect: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 1024,
            max_message_length: 64 * 1024,
            clear_busy_on_disconnect: false,
        }
    }
}

impl RelayConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_PATH).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: RelayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Listener socket address as `host:port`
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_connections == 0 {
            return Err(config::ConfigError::Message(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.max_message_length == 0 {
            return Err(config::ConfigError::Message(
                "max_message_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
