//! Post handlers
//!
//! Post CRUD, likes, replies and the home feed.

use axum::{extract::State, Json};
use social_service::{
    CreatePostRequest, CreateReplyRequest, FeedService, LikeResponse, PostResponse, PostService,
    ReplyResponse,
};

use crate::extractors::{AuthUser, IdPath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> ApiResult<Created<Json<PostResponse>>> {
    let service = PostService::new(state.service_context());
    let post = service.create_post(auth.user_id, request).await?;
    Ok(Created(Json(post)))
}

/// Posts by everyone the caller follows, newest first
///
/// GET /posts/feed
pub async fn get_feed(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<PostResponse>>> {
    let service = FeedService::new(state.service_context());
    Ok(Json(service.get_feed(auth.user_id).await?))
}

/// GET /posts/:post_id
pub async fn get_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath,
) -> ApiResult<Json<PostResponse>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.get_post(post_id).await?))
}

/// DELETE /posts/:post_id
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(post_id): IdPath,
) -> ApiResult<NoContent> {
    PostService::new(state.service_context())
        .delete_post(auth.user_id, post_id)
        .await?;
    Ok(NoContent)
}

/// PUT /posts/:post_id/like
pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(post_id): IdPath,
) -> ApiResult<Json<LikeResponse>> {
    let service = PostService::new(state.service_context());
    Ok(Json(service.toggle_like(auth.user_id, post_id).await?))
}

/// POST /posts/:post_id/replies
pub async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(post_id): IdPath,
    ValidatedJson(request): ValidatedJson<CreateReplyRequest>,
) -> ApiResult<Created<Json<ReplyResponse>>> {
    let service = PostService::new(state.service_context());
    let reply = service.reply(auth.user_id, post_id, request).await?;
    Ok(Created(Json(reply)))
}
