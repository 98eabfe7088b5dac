//! Configuration for gridwatch-proc
//!
//! Priority order: command line > environment > TOML config file > compiled
//! defaults. The data folder (and thus the SQLite path) resolves through
//! `gridwatch_common::config`; everything else lives in the service config.

use crate::services::influx_source::InfluxConfig;
use crate::services::PipelineConfig;
use clap::Parser;
use gridwatch_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// gridwatch-proc - power-quality capture processing service
#[derive(Parser, Debug)]
#[command(name = "gridwatch-proc", version)]
pub struct Args {
    /// Data folder holding the SQLite result store
    #[arg(long, env = "GRIDWATCH_DATA_FOLDER")]
    pub data_folder: Option<String>,

    /// Explicit config file path (default: platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind address override
    #[arg(long, env = "GRIDWATCH_BIND")]
    pub bind: Option<String>,
}

/// Service configuration loaded from TOML with environment overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub influx: InfluxConfig,
    pub processing: PipelineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5811".to_string(),
            influx: InfluxConfig::default(),
            processing: PipelineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from an explicit path, or the platform config file if present,
    /// falling back to defaults. Store credentials can always be supplied
    /// through the environment.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(p) => Some(p.to_path_buf()),
            None => gridwatch_common::config::locate_config_file().ok(),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                let config: ServiceConfig = toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", path.display(), e))
                })?;
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            None => {
                tracing::info!("No config file found, using defaults");
                ServiceConfig::default()
            }
        };

        // Environment overrides for waveform store access
        if let Ok(v) = std::env::var("GRIDWATCH_INFLUX_URL") {
            config.influx.url = v;
        }
        if let Ok(v) = std::env::var("GRIDWATCH_INFLUX_TOKEN") {
            config.influx.token = v;
        }
        if let Ok(v) = std::env::var("GRIDWATCH_INFLUX_ORG") {
            config.influx.org = v;
        }
        if let Ok(v) = std::env::var("GRIDWATCH_INFLUX_BUCKET") {
            config.influx.bucket = v;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:5811");
        assert_eq!(config.processing.expected_samples, 5120);
        assert_eq!(config.processing.measurement, "voltage_waveform");
    }

    #[test]
    fn parses_partial_toml() {
        let config: ServiceConfig = toml::from_str(
            r#"
            bind_addr = "0.0.0.0:8080"

            [influx]
            url = "http://influx.local:8086"
            token = "secret"
            org = "lab"
            bucket = "pq"

            [processing]
            alpha = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.influx.bucket, "pq");
        assert_eq!(config.processing.alpha, 0.1);
        // Unset processing fields keep their defaults
        assert_eq!(config.processing.expected_samples, 5120);
    }
}
