//! Domain errors - error kinds reported by the domain and repository layers

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("User not found: {0}")]
    UsernameNotFound(String),

    #[error("Post not found: {0}")]
    PostNotFound(Snowflake),

    // =========================================================================
    // Validation / Invalid Operation
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    // =========================================================================
    // Authentication / Authorization
    // =========================================================================
    #[error("Wrong credentials")]
    InvalidCredentials,

    #[error("Not the author of this post")]
    NotPostAuthor,

    #[error("Cannot modify another user's account")]
    NotAccountOwner,

    // =========================================================================
    // Conflict
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Username already taken")]
    UsernameAlreadyExists,

    /// The follow edge changed underneath a toggle
    #[error("Follow edge {follower} -> {followee} changed concurrently")]
    FollowConflict {
        follower: Snowflake,
        followee: Snowflake,
    },

    // =========================================================================
    // Infrastructure
    // =========================================================================
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) | Self::UsernameNotFound(_) => "UNKNOWN_USER",
            Self::PostNotFound(_) => "UNKNOWN_POST",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::WeakPassword(_) => "WEAK_PASSWORD",

            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NotPostAuthor => "NOT_POST_AUTHOR",
            Self::NotAccountOwner => "NOT_ACCOUNT_OWNER",

            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            Self::FollowConflict { .. } => "FOLLOW_CONFLICT",

            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::UsernameNotFound(_) | Self::PostNotFound(_)
        )
    }

    /// Malformed input or an operation the domain rules forbid outright
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidOperation(_)
                | Self::ContentTooLong { .. }
                | Self::WeakPassword(_)
        )
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotPostAuthor | Self::NotAccountOwner)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists | Self::UsernameAlreadyExists | Self::FollowConflict { .. }
        )
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
