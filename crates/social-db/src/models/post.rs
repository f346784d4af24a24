//! Post and reply rows

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A `posts` row with its likers aggregated into an array
#[derive(Debug, Clone, FromRow)]
pub struct PostModel {
    pub id: i64,
    pub author_id: i64,
    pub text: String,
    pub img: Option<String>,
    pub likes: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReplyModel {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub text: String,
    pub username: String,
    pub user_profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}
