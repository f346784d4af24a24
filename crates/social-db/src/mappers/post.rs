//! Post and reply models -> entities

use std::collections::HashMap;

use social_core::{Post, Reply, Snowflake};

use super::ids;
use crate::models::{PostModel, ReplyModel};

impl From<ReplyModel> for Reply {
    fn from(model: ReplyModel) -> Self {
        Reply {
            id: Snowflake::new(model.id),
            post_id: Snowflake::new(model.post_id),
            user_id: Snowflake::new(model.user_id),
            text: model.text,
            username: model.username,
            user_profile_pic: model.user_profile_pic,
            created_at: model.created_at,
        }
    }
}

impl From<PostModel> for Post {
    fn from(model: PostModel) -> Self {
        Post {
            id: Snowflake::new(model.id),
            author_id: Snowflake::new(model.author_id),
            text: model.text,
            img: model.img,
            likes: ids(model.likes),
            replies: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Attach replies to their posts, keeping the post order and the reply order
/// they were fetched in.
pub fn assemble_posts(posts: Vec<PostModel>, replies: Vec<ReplyModel>) -> Vec<Post> {
    let mut by_post: HashMap<i64, Vec<Reply>> = HashMap::new();
    for reply in replies {
        by_post.entry(reply.post_id).or_default().push(reply.into());
    }

    posts
        .into_iter()
        .map(|model| {
            let key = model.id;
            let mut post = Post::from(model);
            post.replies = by_post.remove(&key).unwrap_or_default();
            post
        })
        .collect()
}
