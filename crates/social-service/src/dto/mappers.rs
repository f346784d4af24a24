//! Entity to DTO mappers

use social_core::{Post, Reply, Snowflake, User};

use super::responses::{
    CurrentUserResponse, PostResponse, ReplyResponse, UserResponse, UserSummaryResponse,
};

fn id_strings(ids: &[Snowflake]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

// ============================================================================
// User Mappers
// ============================================================================

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            username: user.username.clone(),
            profile_pic: user.profile_pic.clone(),
            bio: user.bio.clone(),
            followers: id_strings(&user.followers),
            following: id_strings(&user.following),
            followers_count: user.followers_count(),
            following_count: user.following_count(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

impl From<&User> for CurrentUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            profile_pic: user.profile_pic.clone(),
            bio: user.bio.clone(),
            followers: id_strings(&user.followers),
            following: id_strings(&user.following),
            is_frozen: user.is_frozen,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

impl From<&User> for UserSummaryResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            username: user.username.clone(),
            profile_pic: user.profile_pic.clone(),
        }
    }
}

impl From<User> for UserSummaryResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

// ============================================================================
// Post Mappers
// ============================================================================

impl From<&Reply> for ReplyResponse {
    fn from(reply: &Reply) -> Self {
        Self {
            id: reply.id.to_string(),
            user_id: reply.user_id.to_string(),
            text: reply.text.clone(),
            username: reply.username.clone(),
            user_profile_pic: reply.user_profile_pic.clone(),
            created_at: reply.created_at,
        }
    }
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            author_id: post.author_id.to_string(),
            text: post.text.clone(),
            img: post.img.clone(),
            likes: id_strings(&post.likes),
            replies: post.replies.iter().map(ReplyResponse::from).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self::from(&post)
    }
}
