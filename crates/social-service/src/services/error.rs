//! Service layer error types

use social_common::AppError;
use social_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain rule violation or repository failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Token, hashing and password-policy failures
    #[error(transparent)]
    App(#[from] AppError),

    /// The service context was assembled without a required piece
    #[error("Incomplete service context: {0}")]
    Incomplete(String),
}

impl ServiceError {
    pub fn incomplete(msg: impl Into<String>) -> Self {
        Self::Incomplete(msg.into())
    }

    /// The wrapped domain error, if any
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) | Self::App(AppError::Domain(e)) => Some(e),
            _ => None,
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) if e.is_not_found() => 404,
            Self::Domain(e) if e.is_validation() => 400,
            Self::Domain(e) if e.is_authentication() => 401,
            Self::Domain(e) if e.is_authorization() => 403,
            Self::Domain(e) if e.is_conflict() => 409,
            Self::Domain(e) if e.is_unavailable() => 503,
            Self::Domain(_) | Self::Incomplete(_) => 500,
            Self::App(e) => e.status_code(),
        }
    }

    /// Error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::Incomplete(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
