//! User model -> entity

use social_core::{Snowflake, User};

use crate::models::UserModel;

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: Snowflake::new(model.id),
            name: model.name,
            username: model.username,
            email: model.email,
            profile_pic: model.profile_pic,
            bio: model.bio,
            followers: ids(model.followers),
            following: ids(model.following),
            is_frozen: model.is_frozen,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Raw BIGINT column values to Snowflakes
pub fn ids(raw: Vec<i64>) -> Vec<Snowflake> {
    raw.into_iter().map(Snowflake::new).collect()
}
