//! Test fixtures and data generators

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Short random suffix so reruns against the same database never collide
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl SignupRequest {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            name: format!("Test User {suffix}"),
            email: format!("test{suffix}@example.com"),
            username: format!("u{suffix}"),
            password: "TestPass123".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_signup(signup: &SignupRequest) -> Self {
        Self {
            username: signup.username.clone(),
            password: signup.password.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowResponse {
    pub following: bool,
    pub followers_count: usize,
    pub following_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatePostRequest {
    pub text: String,
}

impl CreatePostRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub likes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes: usize,
}
