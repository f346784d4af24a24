//! # social-service
//!
//! Application layer: the follow-graph manager, the feed assembler, and the
//! auth, user and post use cases, plus the request/response DTOs the HTTP
//! layer speaks.

pub mod dto;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dto::*;
pub use services::*;
