//! HTTP trigger interface
//!
//! Thin glue over the processing pipeline: callers submit a capture id and
//! receive the structured pipeline outcome translated to an HTTP status.
//! All processing logic lives in `services::pipeline`.

use crate::error::{ApiError, ApiResult};
use crate::services::Outcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gridwatch_common::db::models::Capture;
use serde_json::json;

/// Capture processing and status routes
pub fn capture_routes() -> Router<AppState> {
    Router::new()
        .route("/captures/:capture_id", get(get_capture))
        .route("/captures/:capture_id/process", post(process_capture))
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Trigger processing of one capture.
///
/// Outcome mapping: 200 already-processed, 201 processed, 409 skipped
/// (another invocation in flight), 422 failed (capture is in state `error`).
async fn process_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> impl IntoResponse {
    let outcome = state.pipeline.process(&capture_id).await;

    match outcome {
        Outcome::AlreadyProcessed => (
            StatusCode::OK,
            Json(json!({
                "capture_id": capture_id,
                "outcome": "already_processed",
            })),
        ),
        Outcome::Processed(summary) => (
            StatusCode::CREATED,
            Json(json!({
                "capture_id": capture_id,
                "outcome": "processed",
                "spectrogram": summary,
            })),
        ),
        Outcome::Skipped(reason) => (
            StatusCode::CONFLICT,
            Json(json!({
                "capture_id": capture_id,
                "outcome": "skipped",
                "reason": reason,
            })),
        ),
        Outcome::Failed(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "capture_id": capture_id,
                "outcome": "failed",
                "reason": reason,
            })),
        ),
    }
}

/// Capture status lookup
async fn get_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> ApiResult<Json<Capture>> {
    let capture = crate::db::captures::get_capture(&state.db, &capture_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("capture {}", capture_id)))?;

    Ok(Json(capture))
}

/// Service health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = (chrono::Utc::now() - state.startup_time).num_seconds();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime,
    }))
}
