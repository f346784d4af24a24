//! Heartbeat handler (op 1)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage};
use std::sync::Arc;

pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Record the heartbeat and acknowledge it
    pub async fn handle(connection: &Arc<Connection>) -> HandlerResult<Option<CloseCode>> {
        connection.record_heartbeat();

        connection
            .send(GatewayMessage::heartbeat_ack())
            .await
            .map_err(|_| HandlerError::ConnectionClosed)?;

        tracing::trace!(connection_id = %connection.id(), "Heartbeat acknowledged");
        Ok(None)
    }
}
