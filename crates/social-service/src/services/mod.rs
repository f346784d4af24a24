//! Business logic services
//!
//! Every service borrows a [`ServiceContext`] and is cheap to construct per
//! request.

pub mod auth;
pub mod context;
pub mod error;
pub mod feed;
pub mod follow;
pub mod locks;
pub mod post;
pub mod user;

pub use auth::AuthService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use feed::FeedService;
pub use follow::{FollowOutcome, FollowService};
pub use locks::{FollowLockGuard, FollowLocks};
pub use post::PostService;
pub use user::UserService;
