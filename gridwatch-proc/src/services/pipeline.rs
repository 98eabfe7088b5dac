//! Idempotent capture processing pipeline
//!
//! Drives one capture through fetch -> validate -> normalize -> transform ->
//! persist -> state update. Safe under at-least-once redelivery: a capture
//! already in state `processed` is never re-fetched or re-computed, and all
//! persistence uses upsert semantics so a retry after a prior error cannot
//! duplicate rows. Concurrent invocations for the same capture are excluded
//! through a store-side claim; distinct captures share no mutable state.
//!
//! Failures never propagate to the caller as a crash. Every failure path
//! stamps the capture with the terminal `error` state and surfaces a
//! structured `Outcome::Failed`.

use crate::analysis::{modified_stockwell_transform, normalize};
use crate::db;
use crate::services::{SamplePoint, WaveformSource};
use gridwatch_common::db::models::CaptureState;
use gridwatch_common::SpectrogramBlob;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;

/// Pipeline failure taxonomy. All variants are recoverable at the pipeline
/// level: they surface as `error` capture state plus `Outcome::Failed`.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Fewer samples than the minimum required for a transform
    #[error("insufficient samples: got {got}, need {needed}")]
    InsufficientData { got: usize, needed: usize },

    /// Waveform store unreachable or returned a malformed response
    #[error("waveform source unavailable: {0}")]
    SourceUnavailable(String),

    /// Numerical failure inside the transform, including invalid shape
    #[error("transform error: {0}")]
    TransformError(String),

    /// Write failure against the result store
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Serialization failure while persisting
    #[error("persistence error: {0}")]
    PersistenceOther(#[from] anyhow::Error),
}

impl ProcessError {
    /// Short stable reason string reported in the outcome
    pub fn reason(&self) -> &'static str {
        match self {
            ProcessError::InsufficientData { .. } => "insufficient samples",
            ProcessError::SourceUnavailable(_) => "source unavailable",
            ProcessError::TransformError(_) => "transform error",
            ProcessError::Persistence(_) | ProcessError::PersistenceOther(_) => {
                "persistence error"
            }
        }
    }
}

/// Result of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Capture was already in terminal success state; nothing was done
    AlreadyProcessed,
    /// Capture was processed and its spectrogram persisted
    Processed(SpectrogramSummary),
    /// Invocation gave way to another in-flight run for the same capture
    Skipped(String),
    /// Processing failed; the capture is in state `error`
    Failed(String),
}

/// Summary of a freshly persisted spectrogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrogramSummary {
    pub rows: usize,
    pub cols: usize,
    pub payload_bytes: usize,
}

/// Pipeline tuning; defaults match the acquisition hardware
/// (512 samples/cycle at 60 Hz mains = 30720 Hz, 10-cycle bursts of 5120).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Measurement name the waveform source is queried with
    pub measurement: String,
    /// Acquisition sample rate in Hz
    pub sample_rate_hz: f64,
    /// Minimum and maximum sample count per capture
    pub expected_samples: usize,
    /// Transform order
    pub order_p: i32,
    /// Transform bandwidth scale factor
    pub alpha: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            measurement: "voltage_waveform".to_string(),
            sample_rate_hz: 30720.0,
            expected_samples: 5120,
            order_p: 1,
            alpha: 0.05,
        }
    }
}

/// Capture processing pipeline
pub struct Pipeline {
    db: SqlitePool,
    source: Arc<dyn WaveformSource>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(db: SqlitePool, source: Arc<dyn WaveformSource>, config: PipelineConfig) -> Self {
        Self { db, source, config }
    }

    /// Process one capture end to end. Re-invocation for the same capture is
    /// always safe; see the module docs for the idempotency guarantees.
    pub async fn process(&self, capture_id: &str) -> Outcome {
        // Idempotency check: terminal success is never re-computed
        match db::captures::get_state(&self.db, capture_id).await {
            Ok(Some(CaptureState::Processed)) => {
                tracing::info!(capture_id, "capture already processed, skipping");
                return Outcome::AlreadyProcessed;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(capture_id, error = %e, "state lookup failed");
                return Outcome::Failed("persistence error".to_string());
            }
        }

        // Store-side mutual exclusion against concurrent runs
        match db::claims::try_claim(&self.db, capture_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(capture_id, "capture claimed by another invocation");
                return Outcome::Skipped("processing already in progress".to_string());
            }
            Err(e) => {
                tracing::error!(capture_id, error = %e, "claim failed");
                return Outcome::Failed("persistence error".to_string());
            }
        }

        let outcome = match self.run(capture_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(capture_id, error = %err, "processing failed");
                if let Err(e) = db::captures::mark_error(&self.db, capture_id).await {
                    tracing::error!(capture_id, error = %e, "failed to mark capture as error");
                }
                Outcome::Failed(err.reason().to_string())
            }
        };

        if let Err(e) = db::claims::release(&self.db, capture_id).await {
            tracing::warn!(capture_id, error = %e, "failed to release processing claim");
        }

        outcome
    }

    async fn run(&self, capture_id: &str) -> Result<Outcome, ProcessError> {
        // Create the capture row in state `pending` when this is the first
        // time the id is seen (create-on-first-write entry shape)
        db::captures::ensure_exists(&self.db, capture_id, self.config.sample_rate_hz).await?;

        let mut points = self
            .source
            .fetch(capture_id, &self.config.measurement)
            .await
            .map_err(|e| ProcessError::SourceUnavailable(e.to_string()))?;

        if points.len() < self.config.expected_samples {
            return Err(ProcessError::InsufficientData {
                got: points.len(),
                needed: self.config.expected_samples,
            });
        }
        // Cap at the expected count when the source over-delivers
        points.truncate(self.config.expected_samples);

        let (started_at, duration_ms) = derive_timing(&points).ok_or(
            ProcessError::InsufficientData {
                got: 0,
                needed: self.config.expected_samples,
            },
        )?;
        let sample_count = points.len() as i64;

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let signal = normalize(&values);

        tracing::info!(
            capture_id,
            samples = signal.len(),
            "computing modified Stockwell transform"
        );

        let fs = self.config.sample_rate_hz;
        let p = self.config.order_p;
        let alpha = self.config.alpha;
        // The transform is CPU-bound for seconds at full capture size; run it
        // off the async executor. A panic inside surfaces as a JoinError and
        // becomes a transform failure, not a crash.
        let mst = tokio::task::spawn_blocking(move || {
            modified_stockwell_transform(&signal, fs, p, alpha)
        })
        .await
        .map_err(|e| ProcessError::TransformError(e.to_string()))?;

        let blob = SpectrogramBlob::new(mst.matrix);
        let summary = SpectrogramSummary {
            rows: blob.rows(),
            cols: blob.cols(),
            payload_bytes: blob.encode().len(),
        };

        // Payload and metadata are replaced together; partial writes are not
        // a representable state
        db::spectrograms::upsert(&self.db, capture_id, &blob).await?;

        // One-time side effect: never resets a validated classification
        db::classifications::ensure_placeholder(&self.db, capture_id).await?;

        db::captures::finalize(&self.db, capture_id, started_at, duration_ms, sample_count)
            .await?;

        tracing::info!(
            capture_id,
            rows = summary.rows,
            cols = summary.cols,
            "capture processed"
        );

        Ok(Outcome::Processed(summary))
    }
}

/// Derive start timestamp and elapsed milliseconds from the first and last
/// sample of an ascending point sequence. None for an empty sequence.
fn derive_timing(points: &[SamplePoint]) -> Option<(chrono::DateTime<chrono::Utc>, i64)> {
    let first = points.first()?;
    let last = points.last()?;
    let duration_ms = (last.time - first.time).num_milliseconds();
    Some((first.time, duration_ms))
}
