//! Argon2id password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use social_core::DomainError;

use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password into a PHC string (`$argon2id$...`)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash is an internal error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("stored password hash is malformed: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Injectable wrapper around the free functions
#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(password)
    }

    /// `Err(InvalidCredentials)` on mismatch
    pub fn verify_or_error(&self, password: &str, hash: &str) -> Result<(), AppError> {
        if verify_password(password, hash)? {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

/// Minimum password policy: 8..=128 characters with at least one letter and one digit
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    let reason = if len < MIN_PASSWORD_LEN {
        Some(format!("must be at least {MIN_PASSWORD_LEN} characters long"))
    } else if len > MAX_PASSWORD_LEN {
        Some(format!("must be at most {MAX_PASSWORD_LEN} characters long"))
    } else if !password.chars().any(char::is_alphabetic) {
        Some("must contain a letter".to_string())
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("must contain a digit".to_string())
    } else {
        None
    };

    match reason {
        Some(r) => Err(DomainError::WeakPassword(r).into()),
        None => Ok(()),
    }
}
