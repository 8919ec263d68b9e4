//! Error types for catalog operations.

use std::fmt;

use thiserror::Error;

use crate::db::DbError;

/// Structured classification for catalog database failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogDbErrorKind {
    /// `SQLite` returned busy/locked (another process holds the catalog).
    BusyOrLocked,
    /// Constraint failure (unique/foreign-key/check/not-null).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Filesystem or transport IO failure.
    Io,
    /// Unclassified database failure.
    Other,
}

impl CatalogDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for CatalogDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::Io => "io",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> CatalogDbErrorKind {
    let code = database_error.code();
    if matches!(
        code.as_deref(),
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6")
    ) {
        return CatalogDbErrorKind::BusyOrLocked;
    }

    if database_error.is_unique_violation()
        || database_error.is_foreign_key_violation()
        || database_error.is_check_violation()
        || code
            .as_deref()
            .is_some_and(|value| value.starts_with("SQLITE_CONSTRAINT"))
    {
        return CatalogDbErrorKind::ConstraintViolation;
    }

    if database_error
        .message()
        .to_ascii_lowercase()
        .contains("database is locked")
    {
        return CatalogDbErrorKind::BusyOrLocked;
    }

    CatalogDbErrorKind::Other
}

/// Errors that can occur reading or writing a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database operation failed.
    #[error("catalog database error ({kind}): {message}")]
    Database {
        kind: CatalogDbErrorKind,
        message: String,
    },

    /// The catalog file could not be opened or migrated.
    #[error("failed to open catalog: {0}")]
    Open(#[from] DbError),

    /// An update targeted an episode row that does not exist.
    #[error("catalog episode not found: id {0}")]
    EpisodeNotFound(i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: CatalogDbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl CatalogError {
    /// Returns the typed database error kind, when this is a database error.
    #[must_use]
    pub fn database_kind(&self) -> Option<CatalogDbErrorKind> {
        match self {
            Self::Database { kind, .. } => Some(*kind),
            Self::Open(_) | Self::EpisodeNotFound(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_database_message() {
        let err = CatalogError::Database {
            kind: CatalogDbErrorKind::ConstraintViolation,
            message: "UNIQUE constraint failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("constraint_violation"));
        assert!(msg.contains("UNIQUE constraint failed"));
        assert_eq!(
            err.database_kind(),
            Some(CatalogDbErrorKind::ConstraintViolation)
        );
    }

    #[test]
    fn test_catalog_error_episode_not_found_message() {
        let err = CatalogError::EpisodeNotFound(42);
        assert!(err.to_string().contains("42"));
        assert_eq!(err.database_kind(), None);
    }

    #[test]
    fn test_pool_errors_classified() {
        assert_eq!(
            CatalogDbErrorKind::from_sqlx(&sqlx::Error::PoolTimedOut),
            CatalogDbErrorKind::PoolTimeout
        );
        assert_eq!(
            CatalogDbErrorKind::from_sqlx(&sqlx::Error::PoolClosed),
            CatalogDbErrorKind::PoolClosed
        );
    }
}
