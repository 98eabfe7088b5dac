//! Store-side mutual exclusion for concurrent pipeline invocations
//!
//! The pipeline has no in-process lock registry; concurrent or duplicate
//! invocations for the same capture are serialized through a conditional
//! insert here. The claim row lives only for the duration of one run.

use chrono::Utc;
use sqlx::SqlitePool;

/// Attempt to claim a capture for processing. Returns false when another
/// invocation already holds the claim.
pub async fn try_claim(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO processing_claims (capture_id, claimed_at)
        VALUES (?, ?)
        ON CONFLICT(capture_id) DO NOTHING
        "#,
    )
    .bind(capture_id)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Release a claim taken by `try_claim`
pub async fn release(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM processing_claims WHERE capture_id = ?")
        .bind(capture_id)
        .execute(pool)
        .await?;

    Ok(())
}
