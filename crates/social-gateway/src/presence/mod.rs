//! Presence tracking
//!
//! Which users are online, through which connections.

mod tracker;

pub use tracker::{BroadcastReport, PresenceEvent, PresenceTracker};
