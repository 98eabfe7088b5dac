//! Database record models
//!
//! Plain data structs mirroring the result store tables. All timestamps are
//! stored as RFC 3339 text in SQLite and surfaced as `DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Pending,
    Processed,
    Error,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Pending => "pending",
            CaptureState::Processed => "processed",
            CaptureState::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CaptureState::Pending),
            "processed" => Some(CaptureState::Processed),
            "error" => Some(CaptureState::Error),
            _ => None,
        }
    }
}

/// Manual classification workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationState {
    Pending,
    Validated,
    Rejected,
}

impl ClassificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationState::Pending => "pending",
            ClassificationState::Validated => "validated",
            ClassificationState::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClassificationState::Pending),
            "validated" => Some(ClassificationState::Validated),
            "rejected" => Some(ClassificationState::Rejected),
            _ => None,
        }
    }
}

/// One recorded waveform burst, uniquely identified by its capture id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub capture_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub sample_rate_hz: f64,
    pub sample_count: i64,
    /// Identifier of the acquisition hardware, when reported
    pub hardware_origin: Option<String>,
    pub state: CaptureState,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Persisted transform output for one capture (one-to-one)
#[derive(Debug, Clone)]
pub struct SpectrogramRecord {
    pub capture_id: String,
    /// Self-describing binary payload, see `crate::spectrogram`
    pub payload: Vec<u8>,
    /// JSON metadata: rows, cols, element type
    pub metadata: SpectrogramMetadata,
    pub generated_at: DateTime<Utc>,
}

/// Shape and element-type metadata stored alongside the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrogramMetadata {
    pub rows: usize,
    pub cols: usize,
    pub dtype: String,
}

/// Manual classification placeholder, one-to-one companion of a capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub capture_id: String,
    pub state: ClassificationState,
    pub manual_class: Option<String>,
    pub classified_at: DateTime<Utc>,
}
