//! topicast-player configuration
//!
//! Defaults cover a local backend; a TOML file overrides them and CLI
//! arguments override the file. Estimator heuristics are part of the
//! config so deployments can tune them without a rebuild.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use topicast_common::timing::EstimatorPolicy;

use crate::error::{Error, Result};

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation backend base URL
    pub base_url: String,
    /// Job status poll interval
    pub poll_interval_ms: u64,
    /// Playback speed factor applied at queue attach
    pub playback_speed: Option<f64>,
    /// Duration heuristics for untimed transcript text
    pub estimator: EstimatorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            poll_interval_ms: 3_000,
            playback_speed: None,
            estimator: EstimatorPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration, using defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(250))
    }
}
