//! Signaling protocol
//!
//! Envelope format, message types, payload codec and the negotiation relay.

pub mod envelope;
pub mod handlers;
pub mod messages;
pub mod parser;

pub use envelope::{Envelope, SERVER_SENDER, TO_ALL};
pub use handlers::{handle_disconnect, handle_message};
pub use messages::{ConnectPayload, Delivery, InboundType, OutboundType};
pub use parser::parse_envelope;
