//! sqlx error → domain error mapping

use social_core::DomainError;
use sqlx::Error as SqlxError;

/// Connection-level failures mean the store is unreachable; everything else
/// is a database error.
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            DomainError::Unavailable(e.to_string())
        }
        other => DomainError::DatabaseError(other.to_string()),
    }
}

/// Map a unique violation through `on_unique`, receiving the violated
/// constraint name if the server reported one.
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
    }
    map_db_error(e)
}

/// Like [`map_unique_violation`] but for foreign key violations
pub fn map_foreign_key_violation<F>(e: SqlxError, on_fk: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return on_fk(db_err.constraint());
        }
    }
    map_db_error(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_failures_are_unavailable() {
        assert!(map_db_error(SqlxError::PoolTimedOut).is_unavailable());
        assert!(map_db_error(SqlxError::PoolClosed).is_unavailable());
        assert!(!map_db_error(SqlxError::RowNotFound).is_unavailable());
    }

    #[test]
    fn test_non_database_errors_fall_through() {
        let err = map_unique_violation(SqlxError::RowNotFound, |_| DomainError::EmailAlreadyExists);
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
