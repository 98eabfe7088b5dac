//! Capture row operations
//!
//! The pipeline is the only writer of capture state transitions.

use chrono::{DateTime, Utc};
use gridwatch_common::db::models::{Capture, CaptureState};
use sqlx::{Row, SqlitePool};

/// Look up the processing state of a capture, if the row exists
pub async fn get_state(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<Option<CaptureState>> {
    let row = sqlx::query("SELECT state FROM captures WHERE capture_id = ?")
        .bind(capture_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|r| {
        let state: String = r.get("state");
        CaptureState::parse(&state)
    }))
}

/// Load a full capture row
pub async fn get_capture(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<Option<Capture>> {
    let row = sqlx::query(
        r#"
        SELECT capture_id, started_at, duration_ms, sample_rate_hz, sample_count,
               hardware_origin, state, processed_at, created_at
        FROM captures
        WHERE capture_id = ?
        "#,
    )
    .bind(capture_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let state: String = r.get("state");
        Capture {
            capture_id: r.get("capture_id"),
            started_at: parse_timestamp(r.get("started_at")),
            duration_ms: r.get("duration_ms"),
            sample_rate_hz: r.get("sample_rate_hz"),
            sample_count: r.get("sample_count"),
            hardware_origin: r.get("hardware_origin"),
            state: CaptureState::parse(&state).unwrap_or(CaptureState::Error),
            processed_at: parse_timestamp(r.get("processed_at")),
            created_at: parse_timestamp(r.get("created_at")).unwrap_or_else(Utc::now),
        }
    }))
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Create the capture row in state `pending` if it does not already exist
/// (the create-on-first-write entry shape).
pub async fn ensure_exists(
    pool: &SqlitePool,
    capture_id: &str,
    sample_rate_hz: f64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO captures (capture_id, sample_rate_hz, state, created_at)
        VALUES (?, ?, 'pending', ?)
        ON CONFLICT(capture_id) DO NOTHING
        "#,
    )
    .bind(capture_id)
    .bind(sample_rate_hz)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Transition a capture to the terminal `error` state
pub async fn mark_error(pool: &SqlitePool, capture_id: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE captures SET state = 'error', processed_at = ? WHERE capture_id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(capture_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Write derived timing metadata and transition to `processed`
pub async fn finalize(
    pool: &SqlitePool,
    capture_id: &str,
    started_at: DateTime<Utc>,
    duration_ms: i64,
    sample_count: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE captures
        SET started_at = ?,
            duration_ms = ?,
            sample_count = ?,
            state = 'processed',
            processed_at = ?
        WHERE capture_id = ?
        "#,
    )
    .bind(started_at.to_rfc3339())
    .bind(duration_ms)
    .bind(sample_count)
    .bind(Utc::now().to_rfc3339())
    .bind(capture_id)
    .execute(pool)
    .await?;

    Ok(())
}
