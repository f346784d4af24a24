//! Presence tracker
//!
//! Keeps `user → live connection ids` and the handles behind those ids. A
//! user is online while at least one of their connections is registered.
//! The online set is broadcast to every handle when a user's first
//! connection registers or their last one goes away, and never otherwise.
//!
//! Registry mutations go through one mutex, so concurrent connects and
//! disconnects for the same user can neither lose a removal nor report the
//! transition twice. Sends use `try_send` on each handle's bounded queue, so
//! a slow or dead socket is skipped instead of stalling everybody else.

use crate::connection::{Connection, ConnectionId};
use crate::protocol::{GatewayEventType, GatewayMessage, OnlineUsersPayload};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use social_core::Snowflake;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Connect/disconnect notification for the channel-driven path
#[derive(Debug)]
pub enum PresenceEvent {
    Connected {
        user_id: Snowflake,
        connection: Arc<Connection>,
    },
    Disconnected {
        connection_id: ConnectionId,
    },
}

/// How a fan-out went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Recipients whose queue was full or closed
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Registry {
    online: HashMap<Snowflake, HashSet<ConnectionId>>,
    owners: HashMap<ConnectionId, Snowflake>,
}

impl Registry {
    fn online_set(&self) -> HashSet<Snowflake> {
        self.online.keys().copied().collect()
    }
}

/// Tracks online users and fans events out to their connections
#[derive(Default)]
pub struct PresenceTracker {
    handles: DashMap<ConnectionId, Arc<Connection>>,
    registry: Mutex<Registry>,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register an identified connection for `user_id`.
    ///
    /// Returns `true` if this took the user from offline to online, in which
    /// case the new online set has been broadcast to every handle, the new
    /// one included. Registering an id that is already known, or a
    /// connection whose socket has already shut down, is a no-op.
    pub fn on_connect(&self, user_id: Snowflake, connection: Arc<Connection>) -> bool {
        let connection_id = connection.id().to_string();
        let mut registry = self.registry.lock();

        // Its disconnect may already have run; registering now would never be undone
        if connection.is_closed() {
            debug!(%user_id, %connection_id, "Connection closed before registering");
            return false;
        }

        if registry.owners.contains_key(&connection_id) {
            debug!(%connection_id, "Connection already registered");
            return false;
        }

        self.handles.insert(connection_id.clone(), connection);
        registry.owners.insert(connection_id.clone(), user_id);

        let handles = registry.online.entry(user_id).or_default();
        let came_online = handles.is_empty();
        handles.insert(connection_id.clone());

        if came_online {
            info!(%user_id, %connection_id, "User came online");
            self.broadcast_online(&registry);
        } else {
            debug!(%user_id, %connection_id, handles = handles.len(), "Additional connection");
        }

        came_online
    }

    /// Forget a connection.
    ///
    /// Returns the user if this was their last connection; the new online set
    /// has then been broadcast. Unknown ids are ignored, so a socket may call
    /// this on every close path.
    pub fn on_disconnect(&self, connection_id: &str) -> Option<Snowflake> {
        let mut registry = self.registry.lock();

        self.handles.remove(connection_id);
        let user_id = registry.owners.remove(connection_id)?;

        let went_offline = match registry.online.get_mut(&user_id) {
            Some(handles) => {
                handles.remove(connection_id);
                handles.is_empty()
            }
            None => false,
        };

        if went_offline {
            registry.online.remove(&user_id);
            info!(%user_id, %connection_id, "User went offline");
            self.broadcast_online(&registry);
            Some(user_id)
        } else {
            debug!(%user_id, %connection_id, "Connection closed, user still online");
            None
        }
    }

    /// Feed one event through the same state machine as the direct calls
    pub fn apply(&self, event: PresenceEvent) {
        match event {
            PresenceEvent::Connected { user_id, connection } => {
                self.on_connect(user_id, connection);
            }
            PresenceEvent::Disconnected { connection_id } => {
                self.on_disconnect(&connection_id);
            }
        }
    }

    /// Apply events from `rx` until every sender is dropped
    pub fn spawn_event_loop(self: Arc<Self>, mut rx: mpsc::Receiver<PresenceEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.apply(event);
            }
            debug!("Presence event channel closed");
        })
    }

    pub fn current_online_users(&self) -> HashSet<Snowflake> {
        self.registry.lock().online_set()
    }

    pub fn is_online(&self, user_id: Snowflake) -> bool {
        self.registry.lock().online.contains_key(&user_id)
    }

    /// Send a dispatch to every registered connection
    pub fn broadcast(&self, event: GatewayEventType, payload: &Value) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for entry in &self.handles {
            report.record(deliver(entry.value(), event, payload));
        }
        report
    }

    /// Send a dispatch to every connection of one user
    pub fn send_to_user(&self, user_id: Snowflake, event: GatewayEventType, payload: &Value) -> BroadcastReport {
        let ids: Vec<ConnectionId> = self
            .registry
            .lock()
            .online
            .get(&user_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        let mut report = BroadcastReport::default();
        for id in ids {
            if let Some(connection) = self.handles.get(&id) {
                report.record(deliver(connection.value(), event, payload));
            }
        }
        report
    }

    /// Registered connections
    pub fn connection_count(&self) -> usize {
        self.handles.len()
    }

    pub fn online_count(&self) -> usize {
        self.registry.lock().online.len()
    }

    /// Runs with the registry locked, so every recipient sees online sets in
    /// the order the transitions happened.
    fn broadcast_online(&self, registry: &Registry) {
        let payload = OnlineUsersPayload::from_set(&registry.online_set());
        let payload = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to encode online users");
                return;
            }
        };

        let report = self.broadcast(GatewayEventType::OnlineUsers, &payload);
        debug!(
            online = registry.online.len(),
            delivered = report.delivered,
            skipped = report.skipped,
            "Online users broadcast"
        );
    }
}

impl BroadcastReport {
    fn record(&mut self, delivered: bool) {
        if delivered {
            self.delivered += 1;
        } else {
            self.skipped += 1;
        }
    }
}

fn deliver(connection: &Connection, event: GatewayEventType, payload: &Value) -> bool {
    let message = GatewayMessage::dispatch(event, connection.next_sequence(), payload.clone());
    match connection.try_send(message) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(connection_id = %connection.id(), %event, "Outbound queue full, event dropped");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(connection_id = %connection.id(), %event, "Connection closed, event dropped");
            false
        }
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("connections", &self.connection_count())
            .field("online", &self.online_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle(id: &str) -> (Arc<Connection>, mpsc::Receiver<GatewayMessage>) {
        handle_with_capacity(id, 16)
    }

    fn handle_with_capacity(id: &str, capacity: usize) -> (Arc<Connection>, mpsc::Receiver<GatewayMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Connection::new(id.to_string(), tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<GatewayMessage>) -> Vec<GatewayMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn online_ids(msg: &GatewayMessage) -> Vec<String> {
        assert_eq!(msg.event(), Some(GatewayEventType::OnlineUsers));
        let payload: OnlineUsersPayload = serde_json::from_value(msg.d.clone().unwrap()).unwrap();
        payload.user_ids
    }

    #[test]
    fn test_multiple_handles_keep_user_online() {
        let tracker = PresenceTracker::new();
        let alice = Snowflake::new(1);
        let bob = Snowflake::new(2);

        let (a1, mut a1_rx) = handle("a1");
        let (h1, mut h1_rx) = handle("h1");
        let (h2, mut h2_rx) = handle("h2");

        assert!(tracker.on_connect(alice, a1));
        drain(&mut a1_rx);

        // First handle: offline → online, broadcast reaches the new handle too
        assert!(tracker.on_connect(bob, h1));
        let seen = drain(&mut a1_rx);
        assert_eq!(seen.len(), 1);
        assert_eq!(online_ids(&seen[0]), vec!["1", "2"]);
        assert_eq!(drain(&mut h1_rx).len(), 1);

        // Second handle: no transition, no broadcast
        assert!(!tracker.on_connect(bob, h2));
        assert!(drain(&mut a1_rx).is_empty());
        assert!(drain(&mut h2_rx).is_empty());

        // Closing one of two handles keeps bob online
        assert_eq!(tracker.on_disconnect("h1"), None);
        assert!(tracker.is_online(bob));
        assert!(drain(&mut a1_rx).is_empty());

        // Closing the last one takes bob offline and tells everyone left
        assert_eq!(tracker.on_disconnect("h2"), Some(bob));
        assert!(!tracker.is_online(bob));
        let seen = drain(&mut a1_rx);
        assert_eq!(seen.len(), 1);
        assert_eq!(online_ids(&seen[0]), vec!["1"]);
        assert_eq!(tracker.current_online_users(), HashSet::from([alice]));
    }

    #[test]
    fn test_disconnect_unknown_or_twice_is_noop() {
        let tracker = PresenceTracker::new();
        let (h1, _rx) = handle("h1");
        tracker.on_connect(Snowflake::new(7), h1);

        assert_eq!(tracker.on_disconnect("missing"), None);
        assert_eq!(tracker.on_disconnect("h1"), Some(Snowflake::new(7)));
        assert_eq!(tracker.on_disconnect("h1"), None);
        assert_eq!(tracker.connection_count(), 0);
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn test_reregistering_same_connection_is_noop() {
        let tracker = PresenceTracker::new();
        let (h1, mut rx) = handle("h1");

        assert!(tracker.on_connect(Snowflake::new(1), Arc::clone(&h1)));
        assert!(!tracker.on_connect(Snowflake::new(1), h1));
        assert_eq!(drain(&mut rx).len(), 1);

        assert_eq!(tracker.on_disconnect("h1"), Some(Snowflake::new(1)));
    }

    #[test]
    fn test_connect_after_socket_shutdown_is_ignored() {
        let tracker = PresenceTracker::new();
        let bob = Snowflake::new(2);
        let (h1, h1_rx) = handle("h1");

        // Teardown ran first: the outbound queue is gone and the disconnect
        // found nothing to remove
        drop(h1_rx);
        assert_eq!(tracker.on_disconnect("h1"), None);

        assert!(!tracker.on_connect(bob, h1));
        assert!(!tracker.is_online(bob));
        assert_eq!(tracker.connection_count(), 0);
        assert!(tracker.current_online_users().is_empty());
    }

    #[test]
    fn test_full_or_closed_recipient_does_not_stop_broadcast() {
        let tracker = PresenceTracker::new();
        let (full, _full_rx) = handle_with_capacity("full", 1);
        let (closed, closed_rx) = handle("closed");
        let (healthy, mut healthy_rx) = handle("healthy");

        tracker.on_connect(Snowflake::new(1), full);
        tracker.on_connect(Snowflake::new(2), closed);
        drop(closed_rx);
        tracker.on_connect(Snowflake::new(3), healthy);
        drain(&mut healthy_rx);

        let report = tracker.broadcast(GatewayEventType::OnlineUsers, &json!({"user_ids": []}));
        assert_eq!(report, BroadcastReport { delivered: 1, skipped: 2 });
        assert_eq!(drain(&mut healthy_rx).len(), 1);

        // Presence state is unaffected by delivery failures
        assert_eq!(tracker.online_count(), 3);
    }

    #[test]
    fn test_send_to_user_reaches_only_their_handles() {
        let tracker = PresenceTracker::new();
        let bob = Snowflake::new(2);
        let (a1, mut a1_rx) = handle("a1");
        let (b1, mut b1_rx) = handle("b1");
        let (b2, mut b2_rx) = handle("b2");

        tracker.on_connect(Snowflake::new(1), a1);
        tracker.on_connect(bob, b1);
        tracker.on_connect(bob, b2);
        drain(&mut a1_rx);
        drain(&mut b1_rx);
        drain(&mut b2_rx);

        let report = tracker.send_to_user(bob, GatewayEventType::Ready, &json!({}));
        assert_eq!(report.delivered, 2);
        assert!(drain(&mut a1_rx).is_empty());
        assert_eq!(drain(&mut b1_rx).len(), 1);
        assert_eq!(drain(&mut b2_rx).len(), 1);

        let nobody = tracker.send_to_user(Snowflake::new(99), GatewayEventType::Ready, &json!({}));
        assert_eq!(nobody, BroadcastReport::default());
    }

    #[test]
    fn test_sequence_numbers_are_per_connection() {
        let tracker = PresenceTracker::new();
        let (h1, mut rx) = handle("h1");
        tracker.on_connect(Snowflake::new(1), h1);
        tracker.broadcast(GatewayEventType::OnlineUsers, &json!({}));

        let seqs: Vec<_> = drain(&mut rx).iter().map(|m| m.s).collect();
        assert_eq!(seqs, vec![Some(1), Some(2)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connects_for_one_user_transition_once() {
        let tracker = PresenceTracker::new_shared();
        let user = Snowflake::new(5);

        let mut tasks = Vec::new();
        let mut receivers = Vec::new();
        for i in 0..32 {
            let (conn, rx) = handle(&format!("c{i}"));
            receivers.push(rx);
            let tracker = Arc::clone(&tracker);
            tasks.push(tokio::spawn(async move { tracker.on_connect(user, conn) }));
        }

        let mut transitions = 0;
        for task in tasks {
            if task.await.unwrap() {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert_eq!(tracker.connection_count(), 32);

        let mut tasks = Vec::new();
        for i in 0..32 {
            let tracker = Arc::clone(&tracker);
            tasks.push(tokio::spawn(async move { tracker.on_disconnect(&format!("c{i}")) }));
        }

        let mut offline = 0;
        for task in tasks {
            if task.await.unwrap().is_some() {
                offline += 1;
            }
        }
        assert_eq!(offline, 1);
        assert!(!tracker.is_online(user));
        assert_eq!(tracker.connection_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_connect_disconnect_across_users() {
        let tracker = PresenceTracker::new_shared();

        let mut tasks = Vec::new();
        for i in 0..64i64 {
            let tracker = Arc::clone(&tracker);
            tasks.push(tokio::spawn(async move {
                let (conn, _rx) = handle(&format!("conn-{i}"));
                let user = Snowflake::new(i % 8);
                tracker.on_connect(user, conn);
                tokio::task::yield_now().await;
                if i % 2 == 0 {
                    tracker.on_disconnect(&format!("conn-{i}"));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Odd connections remain; users 1, 3, 5, 7 own them
        assert_eq!(tracker.connection_count(), 32);
        let expected: HashSet<_> = [1, 3, 5, 7].into_iter().map(Snowflake::new).collect();
        assert_eq!(tracker.current_online_users(), expected);
    }

    #[tokio::test]
    async fn test_event_loop_drives_same_state_machine() {
        let tracker = PresenceTracker::new_shared();
        let (tx, rx) = mpsc::channel(8);
        let worker = Arc::clone(&tracker).spawn_event_loop(rx);

        let (h1, mut h1_rx) = handle("h1");
        tx.send(PresenceEvent::Connected {
            user_id: Snowflake::new(9),
            connection: h1,
        })
        .await
        .unwrap();
        tx.send(PresenceEvent::Disconnected {
            connection_id: "h1".into(),
        })
        .await
        .unwrap();
        drop(tx);
        worker.await.unwrap();

        let events: Vec<_> = drain(&mut h1_rx).iter().map(online_ids).collect();
        assert_eq!(events, vec![vec!["9".to_string()]]);
        assert!(tracker.current_online_users().is_empty());
    }
}
