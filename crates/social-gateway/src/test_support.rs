//! Shared fixtures for the crate's unit tests

use crate::presence::PresenceTracker;
use crate::server::GatewayState;
use social_common::AppConfig;
use social_service::testing::{InMemoryStore, TEST_JWT_SECRET};

pub fn config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgresql://unused@localhost/unused".to_string()),
        "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
        _ => None,
    })
    .expect("test configuration")
}

pub fn state(store: &InMemoryStore) -> GatewayState {
    GatewayState::new(store.context(), PresenceTracker::new_shared(), config())
}
