//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in social-core.

mod error;
mod follow;
mod post;
mod user;

pub use follow::PgFollowRepository;
pub use post::PgPostRepository;
pub use user::PgUserRepository;
