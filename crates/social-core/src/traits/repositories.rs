//! Repository traits (ports) - the data access the domain needs
//!
//! The domain declares what it needs; `social-db` provides PostgreSQL
//! implementations and the service crate's test support provides in-memory
//! ones.

use async_trait::async_trait;

use crate::entities::{FollowTransition, LikeToggle, Post, Reply, User};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Directory
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID, with both adjacency lists populated
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;

    /// Find user by exact username
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Insert a new user together with its password hash
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()>;

    /// Persist profile fields (name, username, email, picture, bio).
    ///
    /// Adjacency lists are owned by [`FollowRepository`] and are ignored here.
    async fn update(&self, user: &User) -> RepoResult<()>;

    async fn set_frozen(&self, id: Snowflake, frozen: bool) -> RepoResult<()>;

    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>>;

    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()>;

    /// Candidate users to suggest to `for_user`: not `for_user` itself, not
    /// already followed by it, and not frozen. At most `limit` rows.
    async fn find_suggestion_candidates(
        &self,
        for_user: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<User>>;
}

// ============================================================================
// Follow edges
// ============================================================================

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn is_following(&self, follower: Snowflake, followee: Snowflake) -> RepoResult<bool>;

    /// Flip the edge `follower → followee` atomically.
    ///
    /// `currently_following` is the state the caller observed. If the store
    /// disagrees when the write runs (the edge was concurrently added or
    /// removed), nothing is written and [`DomainError::FollowConflict`] is
    /// returned.
    async fn toggle(
        &self,
        follower: Snowflake,
        followee: Snowflake,
        currently_following: bool,
    ) -> RepoResult<FollowTransition>;

    /// Ids following `user_id`
    async fn followers_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Ids `user_id` follows
    async fn following_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>>;
}

// ============================================================================
// Post Store
// ============================================================================

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find post by ID, with likes and replies populated
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>>;

    /// Posts by one author, newest first
    async fn find_by_author(&self, author_id: Snowflake) -> RepoResult<Vec<Post>>;

    /// Posts by any of `author_ids`, newest first (ties broken by id, newest first)
    async fn find_by_author_in(&self, author_ids: &[Snowflake]) -> RepoResult<Vec<Post>>;

    async fn create(&self, post: &Post) -> RepoResult<()>;

    /// Delete a post and its likes and replies
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Like the post if `user_id` has not liked it yet, otherwise unlike it
    async fn toggle_like(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<LikeToggle>;

    async fn add_reply(&self, reply: &Reply) -> RepoResult<()>;
}
