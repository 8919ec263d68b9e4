//! Database connection and schema management.
//!
//! Each configured library category keeps its own small SQLite catalog.
//! This module owns the connection pool for one such file:
//! - WAL mode for file-backed databases
//! - busy timeout so a concurrent reader never fails immediately
//! - automatic migration execution
//!
//! # Example
//!
//! ```no_run
//! use dvrsync_core::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("/media/tv/.dvrsync/catalog.db")).await?;
//! // Use db for queries...
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::instrument;

/// Default maximum number of connections in the pool.
/// Kept low for SQLite since it uses file-level locking.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in milliseconds.
/// Connections will wait this long before returning SQLITE_BUSY.
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Database-related errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connection(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Failed to create the directory holding the database file.
    #[error("failed to create database directory {path}: {source}")]
    Directory {
        /// Directory that could not be created.
        path: std::path::PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Database connection wrapper with connection pool.
///
/// Handles SQLite connection pooling, WAL mode configuration,
/// and automatic migration execution.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection to the specified path.
    ///
    /// This will:
    /// 1. Create the parent directory and database file if missing
    /// 2. Enable WAL mode for concurrent reads
    /// 3. Run any pending migrations
    ///
    /// # Errors
    ///
    /// Returns `DbError::Directory` if the parent directory cannot be created,
    /// `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if migrations fail.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DbError::Directory {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Built from the path, not a URL: library roots may contain `?` or `%`.
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Creates an in-memory database for testing.
    ///
    /// The pool is capped at a single connection so every query sees the
    /// same in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if migrations fail.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks if WAL mode is enabled.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the query fails.
    #[instrument(skip(self))]
    pub async fn is_wal_enabled(&self) -> Result<bool, DbError> {
        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0.to_lowercase() == "wal")
    }

    /// Gracefully closes all connections in the pool.
    #[instrument(skip(self))]
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_new_in_memory_succeeds() {
        let db = Database::new_in_memory().await;
        assert!(db.is_ok(), "Failed to create in-memory database");
    }

    #[tokio::test]
    async fn test_database_series_table_exists() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO series (series_id, title, category, image_url, start_time, url)
             VALUES ('C123', 'Show', 'series', 'http://img', '2024-01-01T00:00:00Z', 'http://eps')",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_ok(), "Series table should exist after migration");
    }

    #[tokio::test]
    async fn test_database_rejects_unknown_category() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO series (series_id, title, category, image_url, start_time, url)
             VALUES ('C123', 'Show', 'sports', 'http://img', '2024-01-01T00:00:00Z', 'http://eps')",
        )
        .execute(db.pool())
        .await;

        assert!(
            result.is_err(),
            "Unknown category should be rejected by CHECK constraint"
        );
    }

    #[tokio::test]
    async fn test_database_episode_requires_existing_series() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO episodes (
                series_ref, series_start_time, category, channel_name, channel_number,
                end_time, episode_title, image_url, original_airdate, program_id,
                record_end_time, record_start_time, series_id, start_time, synopsis,
                title, filename, play_url, cmd_url, download_started, download_reason
             ) VALUES (
                42, 't', 'series', 'c', '2.1', 't', 'e', 'i', 't', 'p',
                't', 't', 's', 't', 'syn', 'title', 'f.mpg', 'p', 'c', 't', 'new'
             )",
        )
        .execute(db.pool())
        .await;

        assert!(
            result.is_err(),
            "Episode pointing at a missing series should violate the foreign key"
        );
    }

    #[tokio::test]
    async fn test_database_with_tempfile_creates_parent_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join(".dvrsync").join("catalog.db");

        let db = Database::new(&db_path).await;
        assert!(db.is_ok(), "Failed to create database at temp path");
        assert!(db_path.exists());

        let is_wal = db.unwrap().is_wal_enabled().await.unwrap();
        assert!(is_wal, "WAL mode should be enabled for file-based database");
    }

    #[tokio::test]
    async fn test_database_path_with_url_characters_is_taken_literally() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("Shows?mode=ro %41");
        let db_path = root.join(".dvrsync").join("catalog.db");

        let db = Database::new(&db_path).await.unwrap();
        assert!(db.is_wal_enabled().await.unwrap());
        assert!(db_path.exists(), "catalog created at the literal path");
        db.close().await;
    }

    #[tokio::test]
    async fn test_database_close_works() {
        let db = Database::new_in_memory().await.unwrap();
        db.close().await;
    }
}
