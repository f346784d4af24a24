//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use social_core::traits::{RepoResult, UserRepository};
use social_core::{DomainError, Snowflake, User};

use crate::models::UserModel;

use super::error::{map_db_error, map_unique_violation};

/// Column list shared by every user query; adjacency is projected from `follows`.
const USER_COLUMNS: &str = r"
    u.id, u.name, u.username, u.email, u.profile_pic, u.bio, u.is_frozen,
    ARRAY(SELECT f.follower_id FROM follows f WHERE f.followee_id = u.id ORDER BY f.created_at) AS followers,
    ARRAY(SELECT f.followee_id FROM follows f WHERE f.follower_id = u.id ORDER BY f.created_at) AS following,
    u.created_at, u.updated_at
";

/// Which unique constraint a users insert/update tripped
fn duplicate_user(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(c) if c.contains("username") => DomainError::UsernameAlreadyExists,
        _ => DomainError::EmailAlreadyExists,
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, predicate: &str, value: UserKey<'_>) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE {predicate}");
        let query = sqlx::query_as::<_, UserModel>(&sql);
        let query = match value {
            UserKey::Id(id) => query.bind(id.into_inner()),
            UserKey::Text(text) => query.bind(text.to_string()),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(row.map(User::from))
    }
}

enum UserKey<'a> {
    Id(Snowflake),
    Text(&'a str),
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        self.find_one("u.id = $1", UserKey::Id(id)).await
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_one("u.username = $1", UserKey::Text(username)).await
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("u.email = $1", UserKey::Text(email)).await
    }

    #[instrument(skip(self))]
    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self, user, password_hash), fields(user_id = %user.id))]
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, username, email, password_hash, profile_pic, bio,
                               is_frozen, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.profile_pic)
        .bind(&user.bio)
        .bind(user.is_frozen)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_user))?;

        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET name = $2, username = $3, email = $4, profile_pic = $5, bio = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.profile_pic)
        .bind(&user.bio)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, duplicate_user))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(user.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_frozen(&self, id: Snowflake, frozen: bool) -> RepoResult<()> {
        let result = sqlx::query("UPDATE users SET is_frozen = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.into_inner())
            .bind(frozen)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_suggestion_candidates(
        &self,
        for_user: Snowflake,
        limit: i64,
    ) -> RepoResult<Vec<User>> {
        let sql = format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.id <> $1
              AND NOT u.is_frozen
              AND NOT EXISTS (
                  SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.followee_id = u.id
              )
            ORDER BY u.created_at DESC
            LIMIT $2
            "
        );

        let rows = sqlx::query_as::<_, UserModel>(&sql)
            .bind(for_user.into_inner())
            .bind(limit.clamp(1, 100))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
