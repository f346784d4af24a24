//! Integration test utilities for the social backend
//!
//! Helpers for running end-to-end tests against the REST API and the
//! WebSocket gateway backed by a real PostgreSQL database.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
