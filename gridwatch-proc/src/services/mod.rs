//! Processing services

pub mod influx_source;
pub mod pipeline;

pub use influx_source::{InfluxSource, SamplePoint, SourceError, WaveformSource};
pub use pipeline::{Outcome, Pipeline, PipelineConfig, ProcessError, SpectrogramSummary};
