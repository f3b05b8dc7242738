//! Transport layer
//!
//! Line framing, the connection table and the send primitives the relay's
//! deliveries run on.

pub mod framing;
pub mod hub;

pub use framing::read_frame;
pub use hub::ConnectionHub;
