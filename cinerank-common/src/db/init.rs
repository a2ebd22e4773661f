//! Database initialization
//!
//! Creates the database file on first run and brings the schema up
//! idempotently; safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while the snapshot writer runs
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_rankings_table(&pool).await?;
    create_artwork_cache_table(&pool).await?;

    Ok(pool)
}

/// Partition list snapshots: one document row per (owner, epoch, category)
///
/// `ranked` and `unranked` hold the full JSON-serialized item lists; every
/// write replaces the whole document, so last-writer-wins is safe.
async fn create_rankings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rankings (
            owner       TEXT NOT NULL,
            epoch       INTEGER NOT NULL,
            category    TEXT NOT NULL,
            ranked      TEXT NOT NULL DEFAULT '[]',
            unranked    TEXT NOT NULL DEFAULT '[]',
            updated_at  TEXT NOT NULL,
            PRIMARY KEY (owner, epoch, category)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolved poster urls, so artwork survives restarts
async fn create_artwork_cache_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artwork_cache (
            title       TEXT NOT NULL,
            category    TEXT NOT NULL,
            poster_url  TEXT,
            fetched_at  TEXT NOT NULL,
            PRIMARY KEY (title, category)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
