//! Route definitions
//!
//! All API routes are mounted under /api/v1.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, health, posts, users};
use crate::state::AppState;

/// API router without the health probes
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (kept outside rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(post_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/@me",
            get(users::get_current_user).patch(users::update_current_user),
        )
        .route("/users/@me/freeze", post(users::freeze_current_user))
        .route("/users/@me/suggested", get(users::get_suggested_users))
        // `:user` is an id or a username depending on the route
        .route("/users/:user", get(users::get_profile))
        .route("/users/:user/follow", post(users::toggle_follow))
        .route("/users/:user/followers", get(users::get_followers))
        .route("/users/:user/following", get(users::get_following))
        .route("/users/:user/posts", get(users::get_user_posts))
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/feed", get(posts::get_feed))
        .route("/posts/:post_id", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/:post_id/like", put(posts::toggle_like))
        .route("/posts/:post_id/replies", post(posts::create_reply))
}
