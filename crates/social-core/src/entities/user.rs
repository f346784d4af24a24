//! User entity and the follow adjacency it carries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A user account together with both sides of its follow adjacency.
///
/// `followers` and `following` are projections of the same edge set: for any
/// two users `a` and `b`, `b.id ∈ a.following` exactly when
/// `a.id ∈ b.followers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub followers: Vec<Snowflake>,
    pub following: Vec<Snowflake>,
    pub is_frozen: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Snowflake, name: String, username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            username,
            email,
            profile_pic: None,
            bio: None,
            followers: Vec::new(),
            following: Vec::new(),
            is_frozen: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_following(&self, other: Snowflake) -> bool {
        self.following.contains(&other)
    }

    #[inline]
    pub fn is_followed_by(&self, other: Snowflake) -> bool {
        self.followers.contains(&other)
    }

    pub fn followers_count(&self) -> usize {
        self.followers.len()
    }

    pub fn following_count(&self) -> usize {
        self.following.len()
    }

    /// Whether the edge `self → other` is recorded identically on both sides
    pub fn edge_is_mirrored_with(&self, other: &User) -> bool {
        self.is_following(other.id) == other.is_followed_by(self.id)
    }

    pub fn freeze(&mut self) {
        self.is_frozen = true;
        self.updated_at = Utc::now();
    }

    pub fn unfreeze(&mut self) {
        self.is_frozen = false;
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Direction of a follow toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowTransition {
    Followed,
    Unfollowed,
}

impl FollowTransition {
    /// The transition a toggle performs given the current edge state
    pub fn from_current(already_following: bool) -> Self {
        if already_following {
            Self::Unfollowed
        } else {
            Self::Followed
        }
    }

    #[inline]
    pub fn is_following(self) -> bool {
        matches!(self, Self::Followed)
    }
}
