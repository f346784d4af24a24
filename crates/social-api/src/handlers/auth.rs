//! Authentication handlers
//!
//! Signup, login, logout and token refresh. Signup and login also set the
//! access token as an http-only cookie; logout clears it.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use social_service::{AuthResponse, AuthService, LoginRequest, RefreshTokenRequest, SignupRequest};

use crate::extractors::{ValidatedJson, ACCESS_TOKEN_COOKIE};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

fn access_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{ACCESS_TOKEN_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age}; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn with_cookie(state: &AppState, response: AuthResponse) -> impl IntoResponse {
    let cookie = access_cookie(
        &response.access_token,
        response.expires_in,
        state.config().app.env.is_production(),
    );
    (AppendHeaders([(SET_COOKIE, cookie)]), Json(response))
}

/// Register a new user
///
/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = AuthService::new(state.service_context());
    let response = service.signup(request).await?;
    Ok(Created(with_cookie(&state, response)))
}

/// Login with username and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = AuthService::new(state.service_context());
    let response = service.login(request).await?;
    Ok(with_cookie(&state, response))
}

/// Refresh access token
///
/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = AuthService::new(state.service_context());
    let response = service.refresh_tokens(request).await?;
    Ok(with_cookie(&state, response))
}

/// Clear the access token cookie
///
/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = access_cookie("", 0, state.config().app.env.is_production());
    (AppendHeaders([(SET_COOKIE, cookie)]), NoContent)
}
