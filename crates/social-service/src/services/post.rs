//! Post service
//!
//! Creating and deleting posts, likes, replies and per-author timelines.

use social_core::{DomainError, Post, Reply, Snowflake};
use tracing::{info, instrument};

use crate::dto::{CreatePostRequest, CreateReplyRequest, LikeResponse, PostResponse, ReplyResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Post service
pub struct PostService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PostService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, request))]
    pub async fn create_post(
        &self,
        author_id: Snowflake,
        request: CreatePostRequest,
    ) -> ServiceResult<PostResponse> {
        Post::validate_text(&request.text, self.ctx.post_max_length())?;

        let img = request.img.filter(|i| !i.is_empty());
        let post = Post::new(self.ctx.generate_id(), author_id, request.text, img);
        self.ctx.post_repo().create(&post).await?;

        info!(post_id = %post.id, %author_id, "Post created");
        Ok(PostResponse::from(&post))
    }

    #[instrument(skip(self))]
    pub async fn get_post(&self, post_id: Snowflake) -> ServiceResult<PostResponse> {
        Ok(PostResponse::from(&self.load(post_id).await?))
    }

    /// Delete a post; only its author may
    #[instrument(skip(self))]
    pub async fn delete_post(&self, user_id: Snowflake, post_id: Snowflake) -> ServiceResult<()> {
        let post = self.load(post_id).await?;
        if !post.is_authored_by(user_id) {
            return Err(DomainError::NotPostAuthor.into());
        }

        self.ctx.post_repo().delete(post_id).await?;
        info!(%post_id, "Post deleted");
        Ok(())
    }

    /// Like the post, or unlike it if the caller already did
    #[instrument(skip(self))]
    pub async fn toggle_like(&self, user_id: Snowflake, post_id: Snowflake) -> ServiceResult<LikeResponse> {
        let toggle = self.ctx.post_repo().toggle_like(post_id, user_id).await?;
        let post = self.load(post_id).await?;

        let liked = toggle.is_liked();
        info!(%post_id, %user_id, liked, "Like toggled");

        Ok(LikeResponse {
            post_id: post_id.to_string(),
            liked,
            likes: post.like_count(),
        })
    }

    /// Append a reply, capturing the replier's current username and picture
    #[instrument(skip(self, request))]
    pub async fn reply(
        &self,
        user_id: Snowflake,
        post_id: Snowflake,
        request: CreateReplyRequest,
    ) -> ServiceResult<ReplyResponse> {
        Post::validate_text(&request.text, self.ctx.post_max_length())?;

        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let reply = Reply::new(
            self.ctx.generate_id(),
            post_id,
            user_id,
            request.text,
            user.username,
            user.profile_pic,
        );
        self.ctx.post_repo().add_reply(&reply).await?;

        info!(%post_id, reply_id = %reply.id, "Reply added");
        Ok(ReplyResponse::from(&reply))
    }

    /// A user's own posts, newest first
    #[instrument(skip(self))]
    pub async fn user_posts(&self, username: &str) -> ServiceResult<Vec<PostResponse>> {
        let user = self
            .ctx
            .user_repo()
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UsernameNotFound(username.to_string()))?;

        let posts = self.ctx.post_repo().find_by_author(user.id).await?;
        Ok(posts.iter().map(PostResponse::from).collect())
    }

    async fn load(&self, post_id: Snowflake) -> ServiceResult<Post> {
        Ok(self
            .ctx
            .post_repo()
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?)
    }
}
