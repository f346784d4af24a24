//! Service context - dependency container for services
//!
//! Holds the repositories and shared helpers every service needs. The context
//! knows nothing about PostgreSQL; the binaries plug in `social-db`
//! repositories and tests plug in in-memory ones.

use std::sync::Arc;

use social_common::auth::JwtService;
use social_core::traits::{FollowRepository, PostRepository, UserRepository};
use social_core::{Snowflake, SnowflakeGenerator, POST_MAX_LENGTH};

use super::error::{ServiceError, ServiceResult};
use super::locks::FollowLocks;

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    follow_repo: Arc<dyn FollowRepository>,
    post_repo: Arc<dyn PostRepository>,

    // Helpers
    jwt_service: Arc<JwtService>,
    snowflake_generator: Arc<SnowflakeGenerator>,
    follow_locks: FollowLocks,

    post_max_length: usize,
}

impl ServiceContext {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        follow_repo: Arc<dyn FollowRepository>,
        post_repo: Arc<dyn PostRepository>,
        jwt_service: Arc<JwtService>,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            post_repo,
            jwt_service,
            snowflake_generator,
            follow_locks: FollowLocks::new(),
            post_max_length: POST_MAX_LENGTH,
        }
    }

    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn follow_repo(&self) -> &dyn FollowRepository {
        self.follow_repo.as_ref()
    }

    pub fn post_repo(&self) -> &dyn PostRepository {
        self.post_repo.as_ref()
    }

    // === Helpers ===

    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    pub fn follow_locks(&self) -> &FollowLocks {
        &self.follow_locks
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    /// Maximum post and reply length in characters
    pub fn post_max_length(&self) -> usize {
        self.post_max_length
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("follow_locks", &self.follow_locks)
            .field("post_max_length", &self.post_max_length)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    follow_repo: Option<Arc<dyn FollowRepository>>,
    post_repo: Option<Arc<dyn PostRepository>>,
    jwt_service: Option<Arc<JwtService>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    post_max_length: Option<usize>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn follow_repo(mut self, repo: Arc<dyn FollowRepository>) -> Self {
        self.follow_repo = Some(repo);
        self
    }

    pub fn post_repo(mut self, repo: Arc<dyn PostRepository>) -> Self {
        self.post_repo = Some(repo);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn post_max_length(mut self, max: usize) -> Self {
        self.post_max_length = Some(max);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Incomplete` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let mut ctx = ServiceContext::new(
            self.user_repo.ok_or_else(|| ServiceError::incomplete("user_repo is required"))?,
            self.follow_repo.ok_or_else(|| ServiceError::incomplete("follow_repo is required"))?,
            self.post_repo.ok_or_else(|| ServiceError::incomplete("post_repo is required"))?,
            self.jwt_service.ok_or_else(|| ServiceError::incomplete("jwt_service is required"))?,
            self.snowflake_generator
                .ok_or_else(|| ServiceError::incomplete("snowflake_generator is required"))?,
        );

        if let Some(max) = self.post_max_length {
            if max == 0 {
                return Err(ServiceError::incomplete("post_max_length must be positive"));
            }
            ctx.post_max_length = max;
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;

    #[test]
    fn test_builder_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("user_repo"));
    }

    #[test]
    fn test_builder_overrides_post_length() {
        let store = InMemoryStore::new();
        let ctx = store.context_builder().post_max_length(140).build().unwrap();
        assert_eq!(ctx.post_max_length(), 140);
    }

    #[test]
    fn test_builder_rejects_zero_post_length() {
        let store = InMemoryStore::new();
        assert!(store.context_builder().post_max_length(0).build().is_err());
    }
}
