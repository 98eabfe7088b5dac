//! Classification placeholder operations
//!
//! The placeholder is created once, the first time a capture produces a
//! spectrogram. A re-run must not reset an already-validated classification,
//! so the insert never updates an existing row.

use chrono::Utc;
use gridwatch_common::db::models::{Classification, ClassificationState};
use sqlx::{Row, SqlitePool};

/// Create a `pending` classification placeholder if none exists
pub async fn ensure_placeholder(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO classifications (capture_id, state, classified_at)
        VALUES (?, 'pending', ?)
        ON CONFLICT(capture_id) DO NOTHING
        "#,
    )
    .bind(capture_id)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the classification row for a capture
pub async fn get(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<Option<Classification>> {
    let row = sqlx::query(
        "SELECT capture_id, state, manual_class, classified_at FROM classifications WHERE capture_id = ?",
    )
    .bind(capture_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let state: String = r.get("state");
        let classified_at: String = r.get("classified_at");
        Classification {
            capture_id: r.get("capture_id"),
            state: ClassificationState::parse(&state).unwrap_or(ClassificationState::Pending),
            manual_class: r.get("manual_class"),
            classified_at: chrono::DateTime::parse_from_rfc3339(&classified_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }))
}
