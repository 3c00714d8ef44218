// src/config.rs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::EndpointSpec;
use crate::Error;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

/// Startup configuration, loaded once from a JSON file by the server
/// binary and passed into core as plain values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered probe targets; order defines display order.
    pub endpoints: Vec<EndpointSpec>,

    /// Discord channel ids that should each hold one live status message.
    pub status_channels: Vec<u64>,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let cfg: AppConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.endpoints.is_empty() {
            return Err(Error::Config("no endpoints configured".into()));
        }
        if self.status_channels.is_empty() {
            return Err(Error::Config("no status channels configured".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "refresh_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
