//! # social-core
//!
//! Domain layer: users and their follow adjacency, posts with likes and replies,
//! Snowflake identifiers, the domain error type, and the repository ports the
//! infrastructure crates implement.
//!
//! This crate has no dependency on the database, the web framework or the
//! WebSocket transport.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

pub use entities::{FollowTransition, LikeToggle, Post, Reply, User, POST_MAX_LENGTH};
pub use error::DomainError;
pub use traits::{FollowRepository, PostRepository, RepoResult, UserRepository};
pub use value_objects::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
