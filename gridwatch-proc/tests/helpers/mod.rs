//! Shared test fixtures: in-memory result store and a fake waveform source
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use gridwatch_proc::services::{PipelineConfig, SamplePoint, SourceError, WaveformSource};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// In-memory SQLite pool with the result-store schema applied.
/// Single connection so every query sees the same memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    gridwatch_proc::db::init_tables(&pool).await.unwrap();
    pool
}

/// Pipeline config scaled down to 512-sample captures so the transform
/// stays fast in tests; all other parameters match production defaults.
pub fn small_config() -> PipelineConfig {
    PipelineConfig {
        expected_samples: 512,
        ..Default::default()
    }
}

/// Timestamped sine wave points at the acquisition sample rate
pub fn sine_points(n: usize, fs: f64, freq: f64) -> Vec<SamplePoint> {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    (0..n)
        .map(|i| SamplePoint {
            time: base + Duration::nanoseconds((i as f64 * 1e9 / fs) as i64),
            value: (2.0 * std::f64::consts::PI * freq * i as f64 / fs).sin(),
        })
        .collect()
}

enum FakeBehavior {
    Points(Vec<SamplePoint>),
    Fail(String),
}

/// Waveform source serving canned data (or a canned failure)
pub struct FakeSource {
    behavior: FakeBehavior,
}

impl FakeSource {
    pub fn with_points(points: Vec<SamplePoint>) -> Arc<Self> {
        Arc::new(Self {
            behavior: FakeBehavior::Points(points),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior: FakeBehavior::Fail(message.to_string()),
        })
    }
}

#[async_trait]
impl WaveformSource for FakeSource {
    async fn fetch(
        &self,
        _capture_id: &str,
        _measurement: &str,
    ) -> Result<Vec<SamplePoint>, SourceError> {
        match &self.behavior {
            FakeBehavior::Points(points) => Ok(points.clone()),
            FakeBehavior::Fail(message) => Err(SourceError::Query(message.clone())),
        }
    }
}
