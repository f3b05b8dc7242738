//! Presence tracking
//!
//! Maps application client keys to live transport connections and tracks
//! which keys are busy negotiating.

pub mod presence;

pub use presence::PresenceRegistry;

/// Application-supplied identifier of a participant
pub type ClientKey = String;

/// Transport-assigned identifier of one live connection
pub type ConnectionId = u64;
