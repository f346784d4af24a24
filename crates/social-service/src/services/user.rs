//! User service
//!
//! Profiles, profile updates, account freeze, follower lists and suggested
//! users.

use rand::seq::SliceRandom;
use social_common::auth::{hash_password, validate_password_strength};
use social_core::{DomainError, Snowflake, User};
use tracing::{info, instrument};

use crate::dto::{CurrentUserResponse, UpdateUserRequest, UserResponse, UserSummaryResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// How many accounts the suggestion endpoint returns
pub const SUGGESTED_USERS: usize = 4;

/// Size of the candidate pool sampled from
const SUGGESTION_POOL: i64 = 10;

/// User service
pub struct UserService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Public profile by numeric id or username
    #[instrument(skip(self))]
    pub async fn get_profile(&self, query: &str) -> ServiceResult<UserResponse> {
        let user = match Snowflake::parse(query) {
            Ok(id) => self.ctx.user_repo().find_by_id(id).await?,
            Err(_) => None,
        };

        let user = match user {
            Some(user) => user,
            None => self
                .ctx
                .user_repo()
                .find_by_username(query)
                .await?
                .ok_or_else(|| DomainError::UsernameNotFound(query.to_string()))?,
        };

        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn get_current_user(&self, user_id: Snowflake) -> ServiceResult<CurrentUserResponse> {
        Ok(CurrentUserResponse::from(&self.get_user_entity(user_id).await?))
    }

    #[instrument(skip(self))]
    pub async fn get_user_entity(&self, user_id: Snowflake) -> ServiceResult<User> {
        Ok(self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?)
    }

    /// Update the caller's own profile.
    ///
    /// A new password is written only once the profile row has been stored,
    /// so a failed update leaves the old password in place.
    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        user_id: Snowflake,
        request: UpdateUserRequest,
    ) -> ServiceResult<CurrentUserResponse> {
        let mut user = self.get_user_entity(user_id).await?;
        let mut changed = false;

        if let Some(username) = request.username {
            if username != user.username {
                if self.ctx.user_repo().username_exists(&username).await? {
                    return Err(DomainError::UsernameAlreadyExists.into());
                }
                user.username = username;
                changed = true;
            }
        }

        if let Some(email) = request.email {
            if email != user.email {
                if self.ctx.user_repo().email_exists(&email).await? {
                    return Err(DomainError::EmailAlreadyExists.into());
                }
                user.email = email;
                changed = true;
            }
        }

        if let Some(name) = request.name {
            user.name = name;
            changed = true;
        }

        if let Some(profile_pic) = request.profile_pic {
            user.profile_pic = Some(profile_pic).filter(|p| !p.is_empty());
            changed = true;
        }

        if let Some(bio) = request.bio {
            user.bio = Some(bio).filter(|b| !b.is_empty());
            changed = true;
        }

        let password_hash = match request.password {
            Some(password) => {
                validate_password_strength(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        if changed {
            user.touch();
            self.ctx.user_repo().update(&user).await?;
            info!(%user_id, "User profile updated");
        }

        if let Some(hash) = password_hash {
            self.ctx.user_repo().update_password(user_id, &hash).await?;
            info!(%user_id, "Password changed");
        }

        Ok(CurrentUserResponse::from(&user))
    }

    /// Mark the caller's account frozen; the next login reactivates it
    #[instrument(skip(self))]
    pub async fn freeze_account(&self, user_id: Snowflake) -> ServiceResult<()> {
        self.ctx.user_repo().set_frozen(user_id, true).await?;
        info!(%user_id, "Account frozen");
        Ok(())
    }

    /// A few random accounts the caller does not follow yet
    #[instrument(skip(self))]
    pub async fn suggested_users(&self, user_id: Snowflake) -> ServiceResult<Vec<UserSummaryResponse>> {
        let candidates = self
            .ctx
            .user_repo()
            .find_suggestion_candidates(user_id, SUGGESTION_POOL)
            .await?;

        let picked = candidates
            .choose_multiple(&mut rand::thread_rng(), SUGGESTED_USERS)
            .map(UserSummaryResponse::from)
            .collect();

        Ok(picked)
    }

    /// Profiles of the users following `user_id`
    #[instrument(skip(self))]
    pub async fn followers(&self, user_id: Snowflake) -> ServiceResult<Vec<UserSummaryResponse>> {
        self.get_user_entity(user_id).await?;
        let ids = self.ctx.follow_repo().followers_of(user_id).await?;
        self.summaries(&ids).await
    }

    /// Profiles of the users `user_id` follows
    #[instrument(skip(self))]
    pub async fn following(&self, user_id: Snowflake) -> ServiceResult<Vec<UserSummaryResponse>> {
        self.get_user_entity(user_id).await?;
        let ids = self.ctx.follow_repo().following_of(user_id).await?;
        self.summaries(&ids).await
    }

    async fn summaries(&self, ids: &[Snowflake]) -> ServiceResult<Vec<UserSummaryResponse>> {
        let mut users = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(user) = self.ctx.user_repo().find_by_id(id).await? {
                users.push(UserSummaryResponse::from(&user));
            }
        }
        Ok(users)
    }
}
