//! Row → entity conversions
//!
//! Rows map into `social-core` entities via `From`; posts additionally need
//! their replies stitched in, see [`assemble_posts`].

mod post;
mod user;

pub use post::assemble_posts;
pub use user::ids;
