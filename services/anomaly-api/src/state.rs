//! Application state for the anomaly API.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;

use anomaly_resolver::{AnomalyService, ResolverConfig};

/// Shared application state.
pub struct AppState {
    /// Resolver, cache and fallback behind one call.
    pub service: AnomalyService,

    /// Prometheus recorder handle, when one is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create state backed by the remote provider described in `config`.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let service = AnomalyService::from_config(config)?;

        tracing::info!(
            provider = %service.describe_provider(),
            variable = %config.variable,
            cache_capacity = config.cache_capacity,
            granularity = ?config.cache_granularity,
            "Anomaly service initialized"
        );

        Ok(Self::with_service(service))
    }

    /// Wrap an already built service.
    pub fn with_service(service: AnomalyService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
