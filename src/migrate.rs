//! Idempotent schema bootstrap.
//!
//! Creates the `catalog_entries` and `favorites` tables plus their indexes.
//! Running it against an existing database is a no-op.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Entry names are the duplicate key for skip-on-duplicate imports.
    // Filters compare against the `_lc` columns, which hold Rust
    // Unicode-lowercased copies written at insert time.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog_entries (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            type1 TEXT NOT NULL,
            type2 TEXT,
            name_lc TEXT NOT NULL,
            type1_lc TEXT NOT NULL,
            type2_lc TEXT,
            total INTEGER NOT NULL DEFAULT 0,
            hp INTEGER NOT NULL DEFAULT 0,
            attack INTEGER NOT NULL DEFAULT 0,
            defense INTEGER NOT NULL DEFAULT 0,
            sp_attack INTEGER NOT NULL DEFAULT 0,
            sp_defense INTEGER NOT NULL DEFAULT 0,
            speed INTEGER NOT NULL DEFAULT 0,
            generation INTEGER NOT NULL DEFAULT 1,
            legendary INTEGER NOT NULL DEFAULT 0,
            image TEXT NOT NULL,
            ytb_url TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            user_id TEXT NOT NULL,
            entry_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, entry_id),
            FOREIGN KEY (entry_id) REFERENCES catalog_entries(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_generation ON catalog_entries(generation)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_favorites_user_created ON favorites(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
