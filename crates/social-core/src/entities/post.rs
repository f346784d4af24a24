//! Post entity with its likes and replies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Maximum number of characters in a post body
pub const POST_MAX_LENGTH: usize = 500;

/// A post owned by its author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Snowflake,
    pub author_id: Snowflake,
    pub text: String,
    pub img: Option<String>,
    pub likes: Vec<Snowflake>,
    /// Oldest first
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(id: Snowflake, author_id: Snowflake, text: String, img: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            author_id,
            text,
            img,
            likes: Vec::new(),
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a post body against the length limit.
    ///
    /// Length is counted in characters, not bytes.
    pub fn validate_text(text: &str, max_len: usize) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::ValidationError("Post text is required".to_string()));
        }
        if text.chars().count() > max_len {
            return Err(DomainError::ContentTooLong { max: max_len });
        }
        Ok(())
    }

    #[inline]
    pub fn is_authored_by(&self, user_id: Snowflake) -> bool {
        self.author_id == user_id
    }

    #[inline]
    pub fn is_liked_by(&self, user_id: Snowflake) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeToggle {
    Liked,
    Unliked,
}

impl LikeToggle {
    #[inline]
    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}

/// A reply, with the replier's username and picture captured at reply time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub id: Snowflake,
    pub post_id: Snowflake,
    pub user_id: Snowflake,
    pub text: String,
    pub username: String,
    pub user_profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(
        id: Snowflake,
        post_id: Snowflake,
        user_id: Snowflake,
        text: String,
        username: String,
        user_profile_pic: Option<String>,
    ) -> Self {
        Self {
            id,
            post_id,
            user_id,
            text,
            username,
            user_profile_pic,
            created_at: Utc::now(),
        }
    }
}
