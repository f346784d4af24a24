//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Login by username
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

// ============================================================================
// User Requests
// ============================================================================

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: Option<String>,

    /// Picture URL
    #[validate(length(max = 2048, message = "Profile picture URL is too long"))]
    pub profile_pic: Option<String>,

    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,
}

// ============================================================================
// Post Requests
// ============================================================================

/// Create post request.
///
/// The upper bound on `text` is configurable and enforced by the service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "Post text is required"))]
    pub text: String,

    #[validate(length(max = 2048, message = "Image URL is too long"))]
    pub img: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, message = "Reply text is required"))]
    pub text: String,
}
