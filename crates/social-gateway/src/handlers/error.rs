//! Handler error types

use crate::protocol::CloseCode;
use social_service::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    /// The socket's outbound queue is gone
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Close code the socket is shut with
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::InvalidPayload(_) => CloseCode::DecodeError,
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::AlreadyAuthenticated => CloseCode::AlreadyAuthenticated,
            Self::ConnectionClosed | Self::Service(_) | Self::Internal(_) => CloseCode::UnknownError,
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use social_core::DomainError;

    #[test]
    fn test_close_codes() {
        assert_eq!(
            HandlerError::AuthenticationFailed("bad".into()).to_close_code(),
            CloseCode::AuthenticationFailed
        );
        assert_eq!(
            HandlerError::InvalidPayload("x".into()).to_close_code(),
            CloseCode::DecodeError
        );
        assert_eq!(
            HandlerError::from(ServiceError::from(DomainError::Unavailable("db".into()))).to_close_code(),
            CloseCode::UnknownError
        );
    }
}
