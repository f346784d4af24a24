//! Authentication extractor
//!
//! Accepts the access token from an `Authorization: Bearer` header or, for
//! browser clients, from the `access_token` cookie set at login.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization, Cookie},
    TypedHeader,
};
use social_core::Snowflake;

use crate::response::ApiError;
use crate::state::AppState;

/// Name of the cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Snowflake,
}

impl AuthUser {
    pub fn new(user_id: Snowflake) -> Self {
        Self { user_id }
    }
}

async fn bearer_or_cookie<S: Send + Sync>(parts: &mut Parts, state: &S) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }

    TypedHeader::<Cookie>::from_request_parts(parts, state)
        .await
        .ok()
        .and_then(|TypedHeader(cookie)| cookie.get(ACCESS_TOKEN_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(parts, state)
            .await
            .ok_or(ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        let claims = app_state
            .jwt_service()
            .validate_access_token(&token)
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid access token");
                ApiError::App(e)
            })?;

        let user_id = claims.user_id().map_err(|e| {
            tracing::warn!(error = %e, "Invalid user ID in token");
            ApiError::InvalidAuthFormat
        })?;

        Ok(AuthUser::new(user_id))
    }
}
