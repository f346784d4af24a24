//! Frame payloads

use serde::{Deserialize, Serialize};
use social_core::Snowflake;
use std::collections::HashSet;

/// Payload for op 10 (Hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::with_interval(Self::DEFAULT_HEARTBEAT_INTERVAL)
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Access token, with or without a `Bearer ` prefix
    pub token: String,
}

impl IdentifyPayload {
    /// The token without its `Bearer ` prefix
    pub fn bare_token(&self) -> &str {
        self.token.strip_prefix("Bearer ").unwrap_or(&self.token)
    }
}

/// Payload of the READY dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub user_id: String,
    pub online_users: Vec<String>,
}

/// Payload of the ONLINE_USERS dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersPayload {
    pub user_ids: Vec<String>,
}

impl OnlineUsersPayload {
    /// Ids are sorted so every recipient sees the same list
    pub fn from_set(online: &HashSet<Snowflake>) -> Self {
        let mut ids: Vec<Snowflake> = online.iter().copied().collect();
        ids.sort_unstable();
        Self {
            user_ids: ids.into_iter().map(|id| id.to_string()).collect(),
        }
    }
}
