//! Configuration for the anomaly resolver and its service wrapper.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sst_common::{Granularity, TieBreak};

use crate::provider::{PayloadFormat, DEFAULT_QUERY_TEMPLATE};

/// Configuration for resolving anomaly fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the remote dataset server.
    pub base_url: String,

    /// Dataset identifier, bare or with a `.json`/`.csv` suffix.
    pub dataset_id: String,

    /// Name of the anomaly variable inside the dataset.
    pub variable: String,

    /// Payload format used when the dataset id has no suffix.
    pub format: PayloadFormat,

    /// Query template appended to the dataset URL, with `{variable}`,
    /// `{time}`, `{lat}` and `{lon}` filled from each request.
    pub query: Option<String>,

    /// Per-request timeout for the remote provider in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of resolved fields kept in memory.
    pub cache_capacity: usize,

    /// Rounding applied to requested dates to group them under one cache key.
    pub cache_granularity: Granularity,

    /// Which neighbour wins when a date sits exactly between two time steps.
    pub tie_break: TieBreak,

    /// Grid spacing of illustrative fallback fields in degrees.
    pub fallback_resolution_deg: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://coastwatch.pfeg.noaa.gov/erddap/griddap".to_string(),
            dataset_id: "ncdcOisst21Agg_LonPM180".to_string(),
            variable: "anom".to_string(),
            format: PayloadFormat::Table,
            query: Some(DEFAULT_QUERY_TEMPLATE.to_string()),
            request_timeout_secs: 30,
            cache_capacity: 64,
            cache_granularity: Granularity::Daily,
            tie_break: TieBreak::Earlier,
            fallback_resolution_deg: 1.0,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from `SST_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source onto the defaults.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("SST_BASE_URL") {
            config.base_url = val;
        }

        if let Some(val) = lookup("SST_DATASET_ID") {
            config.dataset_id = val;
        }

        if let Some(val) = lookup("SST_VARIABLE") {
            config.variable = val;
        }

        if let Some(val) = lookup("SST_FORMAT") {
            if let Ok(format) = val.parse() {
                config.format = format;
            }
        }

        if let Some(val) = lookup("SST_QUERY") {
            config.query = (!val.is_empty()).then_some(val);
        }

        if let Some(val) = lookup("SST_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Some(val) = lookup("SST_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.cache_capacity = capacity;
            }
        }

        if let Some(val) = lookup("SST_CACHE_GRANULARITY") {
            if let Ok(granularity) = val.parse() {
                config.cache_granularity = granularity;
            }
        }

        if let Some(val) = lookup("SST_TIE_BREAK") {
            if let Ok(tie_break) = val.parse() {
                config.tie_break = tie_break;
            }
        }

        if let Some(val) = lookup("SST_FALLBACK_RESOLUTION_DEG") {
            if let Ok(resolution) = val.parse() {
                config.fallback_resolution_deg = resolution;
            }
        }

        config
    }

    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::info!(
            dataset = %config.dataset_id,
            variable = %config.variable,
            "Loaded resolver config from {:?}",
            path
        );
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.dataset_id.trim().is_empty() {
            return Err("dataset_id must not be empty".to_string());
        }

        if self.variable.trim().is_empty() {
            return Err("variable must not be empty".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        if !(self.fallback_resolution_deg > 0.0 && self.fallback_resolution_deg <= 10.0) {
            return Err("fallback_resolution_deg must be in (0, 10]".to_string());
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
