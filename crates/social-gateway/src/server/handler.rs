//! WebSocket handler
//!
//! One task reads frames, one drains the connection's outbound queue into the
//! socket and one watches the heartbeat. Whichever ends first ends the
//! connection; every exit path unregisters it from the presence tracker.

use crate::connection::Connection;
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::interval;

/// A socket that goes this many heartbeat intervals without one is dropped
const HEARTBEAT_TIMEOUT_FACTOR: u32 = 2;

type SharedSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let gateway = &state.config().gateway;
    let heartbeat_interval = Duration::from_millis(gateway.heartbeat_interval_ms);

    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(gateway.channel_capacity.max(1));
    let connection = Connection::new(Connection::generate_id(), tx);
    let connection_id = connection.id().to_string();

    tracing::info!(%connection_id, "WebSocket connection established");

    let (ws_sink, mut ws_stream) = socket.split();
    let sink: SharedSink = Arc::new(Mutex::new(ws_sink));

    let hello = GatewayMessage::hello(HelloPayload::with_interval(gateway.heartbeat_interval_ms));
    if send_frame(&sink, &hello).await.is_err() {
        tracing::warn!(%connection_id, "Failed to send Hello message");
        return;
    }

    let state_recv = state.clone();
    let connection_recv = Arc::clone(&connection);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(code) = handle_text_message(&state_recv, &connection_recv, &text).await {
                        return Some(code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(connection_id = %connection_recv.id(), "Binary frames not supported");
                    return Some(CloseCode::DecodeError);
                }
                // Pongs are answered by axum
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_recv.id(), "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_recv.id(), error = %e, "WebSocket error");
                    return None;
                }
            }
        }
        None
    });

    let sink_send = Arc::clone(&sink);
    let connection_send = Arc::clone(&connection);
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if send_frame(&sink_send, &msg).await.is_err() {
                tracing::warn!(connection_id = %connection_send.id(), "Failed to write to WebSocket");
                break;
            }
        }
    });

    let connection_hb = Arc::clone(&connection);
    let mut heartbeat_task = tokio::spawn(async move {
        let timeout = heartbeat_interval * HEARTBEAT_TIMEOUT_FACTOR;
        let mut check = interval((heartbeat_interval / 2).max(Duration::from_millis(1)));

        loop {
            check.tick().await;

            if !connection_hb.is_identified() && connection_hb.age() > heartbeat_interval {
                tracing::warn!(connection_id = %connection_hb.id(), "No Identify within the heartbeat interval");
                return CloseCode::NotAuthenticated;
            }

            let since = connection_hb.time_since_heartbeat();
            if since > timeout {
                tracing::warn!(
                    connection_id = %connection_hb.id(),
                    since_ms = since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                return CloseCode::SessionTimeout;
            }
        }
    });

    let close_code = tokio::select! {
        result = &mut recv_task => result.ok().flatten(),
        _ = &mut send_task => None,
        result = &mut heartbeat_task => result.ok(),
    };

    recv_task.abort();
    send_task.abort();
    heartbeat_task.abort();

    // An abort lands at the task's next await; a half-finished Identify must
    // register before the disconnect below, not after it
    join_aborted(recv_task).await;
    join_aborted(send_task).await;
    join_aborted(heartbeat_task).await;

    if let Some(code) = close_code {
        tracing::debug!(%connection_id, %code, "Closing connection");
        close_socket(&sink, code).await;
    }

    cleanup_connection(&state, &connection);
}

/// Wait for an aborted task to stop. The task that won the `select!` has
/// already been polled to completion and is skipped.
async fn join_aborted<T>(task: JoinHandle<T>) {
    if !task.is_finished() {
        let _ = task.await;
    }
}

async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = GatewayMessage::from_json(text).map_err(|e| {
        tracing::debug!(connection_id = %connection.id(), error = %e, "Failed to parse message");
        CloseCode::DecodeError
    })?;

    tracing::trace!(connection_id = %connection.id(), op = %message.op, "Received message");

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(code)) => Err(code),
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::warn!(connection_id = %connection.id(), error = %e, "Handler error");
            Err(e.to_close_code())
        }
    }
}

async fn send_frame(sink: &SharedSink, message: &GatewayMessage) -> Result<(), axum::Error> {
    match message.to_json() {
        Ok(json) => sink.lock().await.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode frame");
            Ok(())
        }
    }
}

async fn close_socket(sink: &SharedSink, code: CloseCode) {
    let (code, reason) = GatewayMessage::close_frame(code);
    let frame = CloseFrame {
        code,
        reason: Cow::Borrowed(reason),
    };
    let _ = sink.lock().await.send(Message::Close(Some(frame))).await;
}

fn cleanup_connection(state: &GatewayState, connection: &Connection) {
    match state.presence().on_disconnect(connection.id()) {
        Some(user_id) => {
            tracing::info!(connection_id = %connection.id(), %user_id, "Connection closed, user offline");
        }
        None => {
            tracing::info!(connection_id = %connection.id(), "Connection closed");
        }
    }
}
