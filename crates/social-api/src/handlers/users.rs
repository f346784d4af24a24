//! User handlers
//!
//! Profiles, the follow toggle, follower lists and suggestions.

use axum::{
    extract::{Path, State},
    Json,
};
use social_service::{
    CurrentUserResponse, FollowResponse, FollowService, PostResponse, PostService,
    UpdateUserRequest, UserResponse, UserService, UserSummaryResponse,
};

use crate::extractors::{AuthUser, IdPath, ValidatedJson};
use crate::response::{ApiResult, NoContent};
use crate::state::AppState;

/// Profile by numeric id or username
///
/// GET /users/:user
pub async fn get_profile(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.get_profile(&query).await?))
}

/// GET /users/@me
pub async fn get_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CurrentUserResponse>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.get_current_user(auth.user_id).await?))
}

/// PATCH /users/@me
pub async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<CurrentUserResponse>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.update_user(auth.user_id, request).await?))
}

/// POST /users/@me/freeze
pub async fn freeze_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<NoContent> {
    UserService::new(state.service_context())
        .freeze_account(auth.user_id)
        .await?;
    Ok(NoContent)
}

/// GET /users/@me/suggested
pub async fn get_suggested_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserSummaryResponse>>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.suggested_users(auth.user_id).await?))
}

/// Follow or unfollow the target user
///
/// POST /users/:user/follow
pub async fn toggle_follow(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(target): IdPath,
) -> ApiResult<Json<FollowResponse>> {
    let outcome = FollowService::new(state.service_context())
        .toggle_follow(auth.user_id, target)
        .await?;
    Ok(Json(outcome.to_response()))
}

/// GET /users/:user/followers
pub async fn get_followers(
    State(state): State<AppState>,
    IdPath(user_id): IdPath,
) -> ApiResult<Json<Vec<UserSummaryResponse>>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.followers(user_id).await?))
}

/// GET /users/:user/following
pub async fn get_following(
    State(state): State<AppState>,
    IdPath(user_id): IdPath,
) -> ApiResult<Json<Vec<UserSummaryResponse>>> {
    let service = UserService::new(state.service_context());
    Ok(Json(service.following(user_id).await?))
}

/// A user's posts, newest first
///
/// GET /users/:user/posts
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<PostResponse>>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.user_posts(&username).await?))
}
