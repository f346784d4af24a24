//! User row with both adjacency lists aggregated from `follows`

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub is_frozen: bool,
    /// `ARRAY(SELECT follower_id ...)`
    pub followers: Vec<i64>,
    /// `ARRAY(SELECT followee_id ...)`
    pub following: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
