//! Repository ports

mod repositories;

pub use repositories::{FollowRepository, PostRepository, RepoResult, UserRepository};
