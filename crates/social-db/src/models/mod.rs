//! Database models - `FromRow` structs for the PostgreSQL tables

mod post;
mod user;

pub use post::{PostModel, ReplyModel};
pub use user::UserModel;
