//! SQLite file holding the reconciliation entries.
//!
//! Opening a file creates it when missing, switches it to WAL so a `list` can
//! read while a `sync` writes, and applies the embedded `migrations/`.
//!
//! # Example
//!
//! ```no_run
//! use traxiv_core::Database;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(Path::new("traxiv.db")).await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, instrument};

/// The pipeline is sequential; a second connection serves ad-hoc reads.
const MAX_CONNECTIONS: u32 = 2;

/// How long a write waits for another run to release the file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to open database: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pooled handle to the store database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file at `db_path` and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the file cannot be opened,
    /// or `DbError::Migration` if migrations fail.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn new(db_path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    /// Creates a private in-memory database.
    ///
    /// One connection only: each SQLite memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` or `DbError::Migration`.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, DbError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Store schema up to date");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Current journal mode as SQLite reports it, lower-cased.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the query fails.
    pub async fn journal_mode(&self) -> Result<String, DbError> {
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;
        Ok(mode.to_ascii_lowercase())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_unique_per_group_and_preprint() {
        let db = Database::new_in_memory().await.unwrap();
        let insert = "INSERT INTO entries (group_id, preprint_doi, preprint, paper, annotation_text)
                      VALUES (?, '10.1101/000001', '{}', '{}', 'text')";

        sqlx::query(insert).bind("g1").execute(db.pool()).await.unwrap();
        let duplicate = sqlx::query(insert).bind("g1").execute(db.pool()).await;
        assert!(duplicate.is_err(), "same preprint twice in a group must be rejected");

        let other_group = sqlx::query(insert).bind("g2").execute(db.pool()).await;
        assert!(other_group.is_ok(), "same preprint in another group is allowed");
    }

    #[tokio::test]
    async fn test_file_database_is_created_in_wal_mode() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("traxiv.db");

        let db = Database::new(&db_path).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(db.journal_mode().await.unwrap(), "wal");
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_connection_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("absent").join("traxiv.db");

        let result = Database::new(&db_path).await;
        assert!(matches!(result, Err(DbError::Connection(_))));
    }
}
