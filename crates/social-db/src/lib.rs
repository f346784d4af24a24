//! # social-db
//!
//! PostgreSQL implementations of the `social-core` repository traits.
//!
//! - connection pool management and schema bootstrap ([`pool`])
//! - `FromRow` row models ([`models`]) and row → entity mappers ([`mappers`])
//! - repositories for users, follow edges and posts ([`repositories`])
//!
//! Both follow adjacency lists are read from the single `follows` edge table,
//! so a user's `following` and the followee's `followers` cannot disagree.
//!
//! ```rust,ignore
//! use social_db::{create_pool, run_migrations, DatabaseConfig, PgFollowRepository};
//!
//! let pool = create_pool(&DatabaseConfig::from_env()).await?;
//! run_migrations(&pool).await?;
//! let follows = PgFollowRepository::new(pool.clone());
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgFollowRepository, PgPostRepository, PgUserRepository};
