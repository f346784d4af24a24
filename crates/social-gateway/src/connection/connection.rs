//! Individual WebSocket connection
//!
//! The gateway side of one socket: its outbound queue, the user it
//! identified as and its heartbeat bookkeeping.

use crate::protocol::GatewayMessage;
use parking_lot::{Mutex, RwLock};
use social_core::Snowflake;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Opaque per-socket identifier
pub type ConnectionId = String;

/// A single WebSocket connection
pub struct Connection {
    id: ConnectionId,

    /// Set once by Identify
    user_id: RwLock<Option<Snowflake>>,

    /// Outbound queue drained by the socket's sender task
    sender: mpsc::Sender<GatewayMessage>,

    /// Last dispatch sequence number handed out
    sequence: AtomicU64,

    last_heartbeat: Mutex<Instant>,

    created_at: Instant,
}

impl Connection {
    pub fn new(id: ConnectionId, sender: mpsc::Sender<GatewayMessage>) -> Arc<Self> {
        Arc::new(Self {
            id,
            user_id: RwLock::new(None),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: Mutex::new(Instant::now()),
            created_at: Instant::now(),
        })
    }

    /// Generate a fresh connection id
    pub fn generate_id() -> ConnectionId {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> Option<Snowflake> {
        *self.user_id.read()
    }

    pub fn is_identified(&self) -> bool {
        self.user_id.read().is_some()
    }

    /// Bind the connection to a user.
    ///
    /// Returns `false` and leaves the binding alone if it was already set.
    pub fn identify(&self, user_id: Snowflake) -> bool {
        let mut slot = self.user_id.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(user_id);
        true
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.lock() = Instant::now();
    }

    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.lock().elapsed()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a message, waiting for room
    pub async fn send(&self, message: GatewayMessage) -> Result<(), mpsc::error::SendError<GatewayMessage>> {
        self.sender.send(message).await
    }

    /// Queue a message without waiting
    pub fn try_send(&self, message: GatewayMessage) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.sender.try_send(message)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id())
            .field("sequence", &self.current_sequence())
            .finish()
    }
}
