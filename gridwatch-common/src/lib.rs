//! # Gridwatch Common Library
//!
//! Shared code for the gridwatch services including:
//! - Database record models (captures, spectrograms, classifications)
//! - Spectrogram binary codec
//! - Configuration loading and data folder resolution
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod spectrogram;

pub use error::{Error, Result};
pub use spectrogram::SpectrogramBlob;
