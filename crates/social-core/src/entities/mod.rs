//! Domain entities

mod post;
mod user;

pub use post::{LikeToggle, Post, Reply, POST_MAX_LENGTH};
pub use user::{FollowTransition, User};
