//! Feed assembler

use social_core::{DomainError, Post, Snowflake};
use tracing::{debug, instrument};

use crate::dto::PostResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Feed service
pub struct FeedService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FeedService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Posts authored by the users `user_id` follows, newest first
    #[instrument(skip(self))]
    pub async fn get_feed(&self, user_id: Snowflake) -> ServiceResult<Vec<PostResponse>> {
        let posts = self.feed_posts(user_id).await?;
        Ok(posts.iter().map(PostResponse::from).collect())
    }

    /// Same as [`Self::get_feed`] but returns the entities
    pub async fn feed_posts(&self, user_id: Snowflake) -> ServiceResult<Vec<Post>> {
        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        if user.following.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self
            .ctx
            .post_repo()
            .find_by_author_in(&user.following)
            .await?;

        debug!(%user_id, followees = user.following.len(), posts = posts.len(), "Feed assembled");
        Ok(posts)
    }
}
