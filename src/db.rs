//! SQLite database connection management.
//!
//! Provides a connection pool with WAL mode enabled. Readers in WAL mode see
//! a consistent snapshot, so a query running during an import observes the
//! catalog either entirely before or entirely after the replacement commits.
//! The database file and its parent directories are created automatically.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Create a connection pool to the configured SQLite database.
///
/// - Creates the database file and parent directories if they don't exist.
/// - Enables WAL journal mode and foreign-key enforcement.
/// - Returns a pool with up to 5 connections.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
