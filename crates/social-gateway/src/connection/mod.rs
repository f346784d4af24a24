//! Live WebSocket connections

mod connection;

pub use connection::{Connection, ConnectionId};
