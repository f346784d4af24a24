//! PostgreSQL implementation of PostRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use social_core::traits::{PostRepository, RepoResult};
use social_core::{DomainError, LikeToggle, Post, Reply, Snowflake};

use crate::mappers::assemble_posts;
use crate::models::{PostModel, ReplyModel};

use super::error::{map_db_error, map_foreign_key_violation};

const POST_COLUMNS: &str = r"
    p.id, p.author_id, p.text, p.img,
    ARRAY(SELECT l.user_id FROM post_likes l WHERE l.post_id = p.id ORDER BY l.created_at) AS likes,
    p.created_at, p.updated_at
";

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load replies for a page of posts in one round-trip and stitch them in
    async fn with_replies(&self, posts: Vec<PostModel>) -> RepoResult<Vec<Post>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let replies = sqlx::query_as::<_, ReplyModel>(
            r"
            SELECT id, post_id, user_id, text, username, user_profile_pic, created_at
            FROM post_replies
            WHERE post_id = ANY($1)
            ORDER BY created_at, id
            ",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(assemble_posts(posts, replies))
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        match row {
            Some(model) => Ok(self.with_replies(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_author(&self, author_id: Snowflake) -> RepoResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.author_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostModel>(&sql)
            .bind(author_id.into_inner())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        self.with_replies(rows).await
    }

    #[instrument(skip(self, author_ids), fields(authors = author_ids.len()))]
    async fn find_by_author_in(&self, author_ids: &[Snowflake]) -> RepoResult<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = author_ids.iter().map(|id| id.into_inner()).collect();
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.author_id = ANY($1) ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, PostModel>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        self.with_replies(rows).await
    }

    #[instrument(skip(self, post), fields(post_id = %post.id))]
    async fn create(&self, post: &Post) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO posts (id, author_id, text, img, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(post.id.into_inner())
        .bind(post.author_id.into_inner())
        .bind(&post.text)
        .bind(&post.img)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, |_| DomainError::UserNotFound(post.author_id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        // likes and replies go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PostNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn toggle_like(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<LikeToggle> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?
            .rows_affected();

        let outcome = if removed > 0 {
            LikeToggle::Unliked
        } else {
            sqlx::query(
                r"
                INSERT INTO post_likes (post_id, user_id, created_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (post_id, user_id) DO NOTHING
                ",
            )
            .bind(post_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_foreign_key_violation(e, |_| DomainError::PostNotFound(post_id)))?;
            LikeToggle::Liked
        };

        tx.commit().await.map_err(map_db_error)?;
        Ok(outcome)
    }

    #[instrument(skip(self, reply), fields(post_id = %reply.post_id))]
    async fn add_reply(&self, reply: &Reply) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO post_replies (id, post_id, user_id, text, username, user_profile_pic, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(reply.id.into_inner())
        .bind(reply.post_id.into_inner())
        .bind(reply.user_id.into_inner())
        .bind(&reply.text)
        .bind(&reply.username)
        .bind(&reply.user_profile_pic)
        .bind(reply.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, |_| DomainError::PostNotFound(reply.post_id)))?;

        Ok(())
    }
}
