//! Axum extractors for request handling

mod auth;
mod path;
mod validated;

pub use auth::{AuthUser, ACCESS_TOKEN_COOKIE};
pub use path::IdPath;
pub use validated::ValidatedJson;
