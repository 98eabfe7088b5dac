//! Spectrogram persistence
//!
//! Payload and shape/dtype metadata are written together in one upsert so a
//! re-run after a prior error can never leave a partial record behind.

use chrono::Utc;
use gridwatch_common::db::models::SpectrogramMetadata;
use gridwatch_common::SpectrogramBlob;
use sqlx::{Row, SqlitePool};

/// Create or replace the spectrogram for a capture as a single unit
pub async fn upsert(
    pool: &SqlitePool,
    capture_id: &str,
    blob: &SpectrogramBlob,
) -> anyhow::Result<()> {
    let payload = blob.encode();
    let metadata = serde_json::to_string(&blob.metadata())?;

    sqlx::query(
        r#"
        INSERT INTO spectrograms (capture_id, payload, metadata, generated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(capture_id) DO UPDATE SET
            payload = excluded.payload,
            metadata = excluded.metadata,
            generated_at = excluded.generated_at
        "#,
    )
    .bind(capture_id)
    .bind(&payload)
    .bind(&metadata)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the raw payload and metadata for a capture, if present
pub async fn load(
    pool: &SqlitePool,
    capture_id: &str,
) -> anyhow::Result<Option<(Vec<u8>, SpectrogramMetadata)>> {
    let row = sqlx::query("SELECT payload, metadata FROM spectrograms WHERE capture_id = ?")
        .bind(capture_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let payload: Vec<u8> = row.get("payload");
            let metadata_json: String = row.get("metadata");
            let metadata: SpectrogramMetadata = serde_json::from_str(&metadata_json)?;
            Ok(Some((payload, metadata)))
        }
        None => Ok(None),
    }
}

/// Count spectrogram rows for a capture (0 or 1 when invariants hold)
pub async fn count(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM spectrograms WHERE capture_id = ?")
        .bind(capture_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}
