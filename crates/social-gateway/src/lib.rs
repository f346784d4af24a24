//! # social-gateway
//!
//! WebSocket gateway that tracks which users are online.
//!
//! A socket becomes a presence handle once it identifies with an access
//! token. The [`presence::PresenceTracker`] keeps every user's set of live
//! handles and broadcasts the online set whenever a user goes from offline to
//! online or back.

pub mod connection;
pub mod handlers;
pub mod presence;
pub mod protocol;
pub mod server;

pub use presence::{PresenceEvent, PresenceTracker};
pub use server::{create_app, create_gateway_state, run, GatewayState};

#[cfg(test)]
mod test_support;
