//! Identify handler (op 2)
//!
//! Turns an anonymous socket into a presence handle: validates the access
//! token, confirms the user still exists, answers with READY and registers
//! the connection with the presence tracker.

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayEventType, GatewayMessage, OnlineUsersPayload, ReadyPayload};
use crate::server::GatewayState;
use social_service::AuthService;
use std::sync::Arc;
use tracing::{info, warn};

pub struct IdentifyHandler;

impl IdentifyHandler {
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: &GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if connection.is_identified() {
            return Err(HandlerError::AlreadyAuthenticated);
        }

        let payload = message
            .as_identify()
            .ok_or_else(|| HandlerError::InvalidPayload("Identify requires a token".to_string()))?;

        let user = AuthService::new(state.service_context())
            .get_user_from_token(payload.bare_token())
            .await
            .map_err(|e| {
                warn!(connection_id = %connection.id(), error = %e, "Identify rejected");
                if e.status_code() == 401 {
                    HandlerError::AuthenticationFailed(e.to_string())
                } else {
                    HandlerError::Service(e)
                }
            })?;

        if !connection.identify(user.id) {
            return Err(HandlerError::AlreadyAuthenticated);
        }

        // READY is queued before registering, so it precedes the
        // ONLINE_USERS broadcast on this socket
        let mut online = state.presence().current_online_users();
        online.insert(user.id);
        let ready = ReadyPayload {
            session_id: connection.id().to_string(),
            user_id: user.id.to_string(),
            online_users: OnlineUsersPayload::from_set(&online).user_ids,
        };
        let frame = GatewayMessage::dispatch(
            GatewayEventType::Ready,
            connection.next_sequence(),
            serde_json::to_value(ready)?,
        );
        connection
            .send(frame)
            .await
            .map_err(|_| HandlerError::ConnectionClosed)?;

        state.presence().on_connect(user.id, Arc::clone(connection));

        info!(
            connection_id = %connection.id(),
            user_id = %user.id,
            username = %user.username,
            "Client identified"
        );

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;
    use crate::test_support;
    use serde_json::json;
    use social_core::Snowflake;
    use social_service::testing::InMemoryStore;
    use tokio::sync::mpsc;

    fn identify(token: &str) -> GatewayMessage {
        GatewayMessage {
            op: OpCode::Identify,
            t: None,
            s: None,
            d: Some(json!({ "token": token })),
        }
    }

    fn token_for(state: &GatewayState, user_id: Snowflake) -> String {
        state
            .service_context()
            .jwt_service()
            .generate_token_pair(user_id, None)
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn test_identify_sends_ready_then_registers() {
        let store = InMemoryStore::new();
        let state = test_support::state(&store);
        let bob = store.seed_user("bob");
        let (tx, mut rx) = mpsc::channel(8);
        let conn = Connection::new("h1".into(), tx);

        let token = format!("Bearer {}", token_for(&state, bob.id));
        let result = IdentifyHandler::handle(&state, &conn, &identify(&token)).await.unwrap();
        assert_eq!(result, None);

        let ready = rx.recv().await.unwrap();
        assert_eq!(ready.event(), Some(GatewayEventType::Ready));
        let payload: ReadyPayload = serde_json::from_value(ready.d.unwrap()).unwrap();
        assert_eq!(payload.user_id, bob.id.to_string());
        assert_eq!(payload.online_users, vec![bob.id.to_string()]);

        let broadcast = rx.recv().await.unwrap();
        assert_eq!(broadcast.event(), Some(GatewayEventType::OnlineUsers));
        assert!(state.presence().is_online(bob.id));
    }

    #[tokio::test]
    async fn test_identify_with_bad_token_fails_authentication() {
        let store = InMemoryStore::new();
        let state = test_support::state(&store);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::new("h1".into(), tx);

        let err = IdentifyHandler::handle(&state, &conn, &identify("garbage"))
            .await
            .unwrap_err();
        assert_eq!(err.to_close_code(), CloseCode::AuthenticationFailed);
        assert!(!conn.is_identified());
        assert_eq!(state.presence().online_count(), 0);
    }

    #[tokio::test]
    async fn test_identify_for_deleted_user_fails_authentication() {
        let store = InMemoryStore::new();
        let state = test_support::state(&store);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::new("h1".into(), tx);

        let token = token_for(&state, Snowflake::new(4242));
        let err = IdentifyHandler::handle(&state, &conn, &identify(&token))
            .await
            .unwrap_err();
        assert_eq!(err.to_close_code(), CloseCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_identify_twice_is_rejected() {
        let store = InMemoryStore::new();
        let state = test_support::state(&store);
        let bob = store.seed_user("bob");
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::new("h1".into(), tx);
        let token = token_for(&state, bob.id);

        IdentifyHandler::handle(&state, &conn, &identify(&token)).await.unwrap();
        let err = IdentifyHandler::handle(&state, &conn, &identify(&token))
            .await
            .unwrap_err();
        assert_eq!(err.to_close_code(), CloseCode::AlreadyAuthenticated);
        assert_eq!(state.presence().connection_count(), 1);
    }

    #[tokio::test]
    async fn test_identify_without_token_is_decode_error() {
        let store = InMemoryStore::new();
        let state = test_support::state(&store);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Connection::new("h1".into(), tx);

        let mut message = identify("x");
        message.d = Some(json!({ "nope": true }));
        let err = IdentifyHandler::handle(&state, &conn, &message).await.unwrap_err();
        assert_eq!(err.to_close_code(), CloseCode::DecodeError);
    }
}
