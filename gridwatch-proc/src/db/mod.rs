//! Database access for gridwatch-proc
//!
//! Raw sqlx queries against the shared SQLite result store.

pub mod captures;
pub mod claims;
pub mod classifications;
pub mod spectrograms;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool against the result store
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the result-store tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS captures (
            capture_id TEXT PRIMARY KEY,
            started_at TEXT,
            duration_ms INTEGER,
            sample_rate_hz REAL NOT NULL,
            sample_count INTEGER NOT NULL DEFAULT 0,
            hardware_origin TEXT,
            state TEXT NOT NULL DEFAULT 'pending',
            processed_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spectrograms (
            capture_id TEXT PRIMARY KEY REFERENCES captures(capture_id) ON DELETE CASCADE,
            payload BLOB NOT NULL,
            metadata TEXT NOT NULL,
            generated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classifications (
            capture_id TEXT PRIMARY KEY REFERENCES captures(capture_id) ON DELETE CASCADE,
            state TEXT NOT NULL DEFAULT 'pending',
            manual_class TEXT,
            classified_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processing_claims (
            capture_id TEXT PRIMARY KEY,
            claimed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_captures_state ON captures(state)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_captures_started_at ON captures(started_at)")
        .execute(pool)
        .await?;

    tracing::info!(
        "Database tables initialized (captures, spectrograms, classifications, processing_claims)"
    );

    Ok(())
}
