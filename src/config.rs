//! Configuration management for floodgate.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};
use crate::ratelimit::Limiter;

/// Declarative limiter topology: regions and the rates that constrain them.
///
/// A configuration is inert until [`apply`](LimiterConfig::apply)ed to a
/// limiter, which registers every region and rate in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Rate constraints per region name. A region with an empty list admits
    /// everything.
    #[serde(default)]
    pub regions: HashMap<String, Vec<RateConfig>>,
}

/// One rate constraint in configuration form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateConfig {
    /// Admissions allowed per window.
    pub max: u32,

    /// Window length in seconds. Zero declares a one-time budget that never
    /// replenishes.
    pub period: u32,
}

impl LimiterConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading limiter configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| FloodgateError::Config(format!("Failed to parse limiter config: {}", e)))
    }

    /// Register every configured region and rate on a limiter.
    ///
    /// Region iteration order is unspecified and irrelevant (regions are
    /// independent); within a region, rates are registered in list order.
    /// Fails if any region already exists or the limiter is stopped.
    pub fn apply(&self, limiter: &Limiter) -> Result<()> {
        for (name, rates) in &self.regions {
            limiter.add_region(name)?;
            for rate in rates {
                limiter.add_rate(rate.max, rate.period, name)?;
            }
        }
        Ok(())
    }
}
