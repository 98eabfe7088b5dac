//! Waveform source client for the InfluxDB time-series store
//!
//! The acquisition hardware streams each capture into InfluxDB tagged with
//! its capture id. This client pulls the ordered (timestamp, value) points
//! back out through the v2 query API. The source is a trait so the pipeline
//! can be driven by a fake in tests; the production implementation is an
//! explicitly constructed, injectable client rather than a process-wide
//! singleton.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Waveform source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Store unreachable or query rejected
    #[error("query failed: {0}")]
    Query(String),

    /// Response could not be parsed
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One sample of a raw waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Ordered time-series store of waveform captures
#[async_trait]
pub trait WaveformSource: Send + Sync {
    /// Fetch the sample sequence for one capture, sorted ascending by
    /// timestamp and truncated to the source's configured maximum.
    async fn fetch(
        &self,
        capture_id: &str,
        measurement: &str,
    ) -> Result<Vec<SamplePoint>, SourceError>;
}

/// InfluxDB v2 connection settings
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8086".to_string(),
            token: String::new(),
            org: "gridwatch".to_string(),
            bucket: "captures".to_string(),
        }
    }
}

/// InfluxDB-backed waveform source
pub struct InfluxSource {
    http: reqwest::Client,
    config: InfluxConfig,
    /// Hard cap on points per capture; over-delivery is truncated here
    max_points: usize,
}

impl InfluxSource {
    pub fn new(config: InfluxConfig, max_points: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            max_points,
        }
    }

    fn flux_query(&self, capture_id: &str, measurement: &str) -> String {
        format!(
            r#"from(bucket: "{bucket}")
  |> range(start: 0)
  |> filter(fn: (r) => r._measurement == "{measurement}")
  |> filter(fn: (r) => r.capture_id == "{capture_id}")
  |> sort(columns: ["_time"])"#,
            bucket = self.config.bucket,
            measurement = measurement,
            capture_id = capture_id,
        )
    }
}

#[async_trait]
impl WaveformSource for InfluxSource {
    async fn fetch(
        &self,
        capture_id: &str,
        measurement: &str,
    ) -> Result<Vec<SamplePoint>, SourceError> {
        let url = format!("{}/api/v2/query", self.config.url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .query(&[("org", self.config.org.as_str())])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Accept", "application/csv")
            .header("Content-Type", "application/vnd.flux")
            .body(self.flux_query(capture_id, measurement))
            .send()
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Query(format!(
                "status {} from waveform store",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Query(e.to_string()))?;

        let mut points = parse_annotated_csv(&body)?;
        points.sort_by_key(|p| p.time);
        if points.len() > self.max_points {
            tracing::debug!(
                capture_id,
                returned = points.len(),
                kept = self.max_points,
                "waveform store over-delivered, truncating"
            );
            points.truncate(self.max_points);
        }
        Ok(points)
    }
}

/// Parse the annotated-CSV body returned by the v2 query API.
///
/// Annotation lines start with '#'. Each result table repeats its header
/// row, so a header is re-detected whenever a line names the `_time` column.
fn parse_annotated_csv(body: &str) -> Result<Vec<SamplePoint>, SourceError> {
    let mut columns: Option<(usize, usize)> = None;
    let mut points = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.iter().any(|f| *f == "_time") {
            let time_idx = fields.iter().position(|f| *f == "_time");
            let value_idx = fields.iter().position(|f| *f == "_value");
            columns = match (time_idx, value_idx) {
                (Some(t), Some(v)) => Some((t, v)),
                _ => {
                    return Err(SourceError::Malformed(
                        "header row missing _time or _value column".to_string(),
                    ))
                }
            };
            continue;
        }

        let (time_idx, value_idx) = columns.ok_or_else(|| {
            SourceError::Malformed("data row before any header row".to_string())
        })?;
        if fields.len() <= time_idx.max(value_idx) {
            return Err(SourceError::Malformed(format!(
                "row has {} fields, expected at least {}",
                fields.len(),
                time_idx.max(value_idx) + 1
            )));
        }

        let time = DateTime::parse_from_rfc3339(fields[time_idx])
            .map_err(|e| SourceError::Malformed(format!("bad timestamp: {}", e)))?
            .with_timezone(&Utc);
        let value: f64 = fields[value_idx]
            .parse()
            .map_err(|e| SourceError::Malformed(format!("bad value: {}", e)))?;

        points.push(SamplePoint { time, value });
    }

    Ok(points)
}
