//! # social-api
//!
//! REST API server built with Axum: auth, profiles and the follow graph,
//! posts and the home feed.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run};
pub use state::AppState;

#[cfg(test)]
mod test_support;
