//! Authentication service
//!
//! Handles signup, login and token refresh. Tokens are stateless JWTs; there
//! is no server-side session store, so logout is a cookie concern of the
//! HTTP layer.

use social_common::auth::{hash_password, validate_password_strength, verify_password};
use social_common::AppError;
use social_core::{DomainError, Snowflake, User};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{AuthResponse, CurrentUserResponse, LoginRequest, RefreshTokenRequest, SignupRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new user
    #[instrument(skip(self, request), fields(username = %request.username, email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> ServiceResult<AuthResponse> {
        validate_password_strength(&request.password)?;

        if self.ctx.user_repo().email_exists(&request.email).await? {
            return Err(DomainError::EmailAlreadyExists.into());
        }
        if self.ctx.user_repo().username_exists(&request.username).await? {
            return Err(DomainError::UsernameAlreadyExists.into());
        }

        let password_hash = hash_password(&request.password)?;

        let user = User::new(
            self.ctx.generate_id(),
            request.name,
            request.username,
            request.email,
        );

        // A concurrent signup can still win the race; the store's unique
        // constraints report it as the same conflict.
        self.ctx.user_repo().create(&user, &password_hash).await?;

        info!(user_id = %user.id, "User signed up");

        self.issue_tokens(&user)
    }

    /// Login with username and password.
    ///
    /// Logging in reactivates a frozen account.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let mut user = self
            .ctx
            .user_repo()
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: unknown username");
                DomainError::UsernameNotFound(request.username.clone())
            })?;

        let password_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "Login failed: no password hash");
                DomainError::InvalidCredentials
            })?;

        if !verify_password(&request.password, &password_hash)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(DomainError::InvalidCredentials.into());
        }

        if user.is_frozen {
            self.ctx.user_repo().set_frozen(user.id, false).await?;
            user.unfreeze();
            info!(user_id = %user.id, "Frozen account reactivated on login");
        }

        info!(user_id = %user.id, "User logged in");

        self.issue_tokens(&user)
    }

    /// Exchange a refresh token for a new token pair
    #[instrument(skip(self, request))]
    pub async fn refresh_tokens(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse> {
        let claims = self
            .ctx
            .jwt_service()
            .validate_refresh_token(&request.refresh_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        info!(user_id = %user.id, "Tokens refreshed");

        self.issue_tokens(&user)
    }

    /// Validate an access token and return the user ID
    pub fn validate_token(&self, token: &str) -> ServiceResult<Snowflake> {
        let claims = self.ctx.jwt_service().validate_access_token(token)?;
        Ok(claims.user_id()?)
    }

    /// Resolve an access token to an existing user
    #[instrument(skip(self, token))]
    pub async fn get_user_from_token(&self, token: &str) -> ServiceResult<User> {
        let user_id = self.validate_token(token)?;

        self.ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))
    }

    fn issue_tokens(&self, user: &User) -> ServiceResult<AuthResponse> {
        let session_id = Uuid::new_v4().to_string();
        let pair = self
            .ctx
            .jwt_service()
            .generate_token_pair(user.id, Some(session_id))?;

        Ok(AuthResponse::new(
            pair.access_token,
            pair.refresh_token,
            pair.expires_in,
            CurrentUserResponse::from(user),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;
    use social_core::traits::UserRepository;

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            name: username.to_uppercase(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: "password123".to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let auth = AuthService::new(&ctx);

        let signed_up = auth.signup(signup_request("alice")).await.unwrap();
        assert_eq!(signed_up.user.username, "alice");
        assert_eq!(signed_up.token_type, "Bearer");

        let logged_in = auth.login(login_request("alice", "password123")).await.unwrap();
        assert_eq!(logged_in.user.id, signed_up.user.id);

        let user_id = auth.validate_token(&logged_in.access_token).unwrap();
        assert_eq!(user_id.to_string(), signed_up.user.id);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let auth = AuthService::new(&ctx);
        auth.signup(signup_request("alice")).await.unwrap();

        let err = auth.signup(signup_request("alice")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "EMAIL_ALREADY_EXISTS");

        let mut same_username = signup_request("alice");
        same_username.email = "other@example.com".to_string();
        let err = auth.signup(same_username).await.unwrap_err();
        assert_eq!(err.error_code(), "USERNAME_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_signup_rejects_weak_password() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let mut request = signup_request("alice");
        request.password = "abcdefgh".to_string();

        let err = AuthService::new(&ctx).signup(request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_login_unknown_user_and_wrong_password() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let auth = AuthService::new(&ctx);
        auth.signup(signup_request("alice")).await.unwrap();

        let err = auth.login(login_request("nobody", "password123")).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = auth.login(login_request("alice", "wrongpass1")).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_unfreezes_account() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let auth = AuthService::new(&ctx);
        let response = auth.signup(signup_request("alice")).await.unwrap();
        let id = Snowflake::parse(&response.user.id).unwrap();

        store.set_frozen(id, true).await.unwrap();
        let logged_in = auth.login(login_request("alice", "password123")).await.unwrap();

        assert!(!logged_in.user.is_frozen);
        assert!(!store.find_by_id(id).await.unwrap().unwrap().is_frozen);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let store = InMemoryStore::new();
        let ctx = store.context();
        let auth = AuthService::new(&ctx);
        let response = auth.signup(signup_request("alice")).await.unwrap();

        let refreshed = auth
            .refresh_tokens(RefreshTokenRequest {
                refresh_token: response.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(refreshed.user.id, response.user.id);

        let err = auth
            .refresh_tokens(RefreshTokenRequest {
                refresh_token: response.access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
