//! PostgreSQL implementation of FollowRepository
//!
//! An edge is one row in `follows`; both adjacency lists are read from it, so
//! a toggle is a single-row write inside one transaction. The transaction
//! first takes a transaction-scoped advisory lock on the follower id, which
//! serializes toggles by the same actor across every process sharing the
//! database.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use social_core::traits::{FollowRepository, RepoResult};
use social_core::{DomainError, FollowTransition, Snowflake};

use super::error::{map_db_error, map_foreign_key_violation};
use crate::mappers::ids;

/// Namespace for follow advisory locks, keeps them apart from other
/// `pg_advisory_xact_lock` users of the same database.
const FOLLOW_LOCK_NAMESPACE: i32 = 0x666F;

#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Which endpoint a foreign key failure on `follows` refers to
fn missing_endpoint(constraint: Option<&str>, follower: Snowflake, followee: Snowflake) -> DomainError {
    match constraint {
        Some(c) if c.contains("follower") => DomainError::UserNotFound(follower),
        _ => DomainError::UserNotFound(followee),
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    #[instrument(skip(self))]
    async fn is_following(&self, follower: Snowflake, followee: Snowflake) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower.into_inner())
        .bind(followee.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn toggle(
        &self,
        follower: Snowflake,
        followee: Snowflake,
        currently_following: bool,
    ) -> RepoResult<FollowTransition> {
        if follower == followee {
            return Err(DomainError::InvalidOperation(
                "You cannot follow or unfollow yourself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Lock key is the low 32 bits of the follower id
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(FOLLOW_LOCK_NAMESPACE)
            .bind(follower.into_inner() as i32)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let transition = FollowTransition::from_current(currently_following);
        let affected = match transition {
            FollowTransition::Unfollowed => sqlx::query(
                "DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2",
            )
            .bind(follower.into_inner())
            .bind(followee.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?
            .rows_affected(),
            FollowTransition::Followed => sqlx::query(
                r"
                INSERT INTO follows (follower_id, followee_id, created_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (follower_id, followee_id) DO NOTHING
                ",
            )
            .bind(follower.into_inner())
            .bind(followee.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_foreign_key_violation(e, |c| missing_endpoint(c, follower, followee)))?
            .rows_affected(),
        };

        if affected == 0 {
            // The edge was already in the target state; leave it untouched.
            tx.rollback().await.map_err(map_db_error)?;
            warn!(%follower, %followee, ?transition, "Follow edge changed concurrently");
            return Err(DomainError::FollowConflict { follower, followee });
        }

        tx.commit().await.map_err(map_db_error)?;
        debug!(%follower, %followee, ?transition, "Follow edge toggled");

        Ok(transition)
    }

    #[instrument(skip(self))]
    async fn followers_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT follower_id FROM follows WHERE followee_id = $1 ORDER BY created_at",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids(rows))
    }

    #[instrument(skip(self))]
    async fn following_of(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT followee_id FROM follows WHERE follower_id = $1 ORDER BY created_at",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids(rows))
    }
}
