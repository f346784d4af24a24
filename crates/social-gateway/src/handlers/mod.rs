//! Handlers for client op codes

mod error;
mod heartbeat;
mod identify;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Routes a client frame to its handler
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one frame. `Ok(Some(code))` asks the socket to close.
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        match message.op {
            OpCode::Heartbeat => HeartbeatHandler::handle(connection).await,
            OpCode::Identify => IdentifyHandler::handle(state, connection, &message).await,
            op => {
                tracing::debug!(connection_id = %connection.id(), %op, "Client sent a server-only op code");
                Ok(Some(CloseCode::UnknownOpcode))
            }
        }
    }
}
