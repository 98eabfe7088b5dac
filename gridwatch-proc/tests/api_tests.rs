//! HTTP trigger interface tests
//!
//! Exercises outcome-to-status mapping through the real router with an
//! in-memory result store and a fake waveform source.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gridwatch_proc::services::{Pipeline, PipelineConfig};
use gridwatch_proc::{build_router, AppState};
use helpers::{sine_points, small_config, test_pool, FakeSource};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with_source(
    source: Arc<helpers::FakeSource>,
    config: PipelineConfig,
) -> (axum::Router, sqlx::SqlitePool) {
    let pool = test_pool().await;
    let pipeline = Arc::new(Pipeline::new(pool.clone(), source, config));
    let state = AppState::new(pool.clone(), pipeline);
    (build_router(state), pool)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let source = FakeSource::with_points(Vec::new());
    let (app, _pool) = app_with_source(source, small_config()).await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn process_maps_processed_then_already_processed() {
    let source = FakeSource::with_points(sine_points(512, 30720.0, 60.0));
    let (app, _pool) = app_with_source(source, small_config()).await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/captures/cap-api-1/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "processed");
    assert_eq!(json["spectrogram"]["rows"], 256);

    let response = app
        .oneshot(
            Request::post("/captures/cap-api-1/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "already_processed");
}

#[tokio::test]
async fn process_maps_failure_to_unprocessable_entity() {
    // 100 samples against the production minimum of 5120
    let source = FakeSource::with_points(sine_points(100, 30720.0, 60.0));
    let (app, _pool) = app_with_source(source, PipelineConfig::default()).await;

    let response = app
        .oneshot(
            Request::post("/captures/cap-api-2/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["reason"], "insufficient samples");
}

#[tokio::test]
async fn capture_status_reflects_processing() {
    let source = FakeSource::with_points(sine_points(512, 30720.0, 60.0));
    let (app, _pool) = app_with_source(source, small_config()).await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/captures/cap-api-3/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::get("/captures/cap-api-3").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "processed");
    assert_eq!(json["sample_count"], 512);
}

#[tokio::test]
async fn unknown_capture_status_is_not_found() {
    let source = FakeSource::with_points(Vec::new());
    let (app, _pool) = app_with_source(source, small_config()).await;

    let response = app
        .oneshot(Request::get("/captures/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
