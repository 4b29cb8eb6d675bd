//! High-level anomaly field service.
//!
//! `AnomalyService` is what HTTP handlers talk to. It wraps the resolver with
//! the field cache and the illustrative fallback:
//!
//! ```text
//! target ──► key = (truncate(target, granularity), bbox)
//!                 │
//!                 ▼
//!        cached step covers target? ──yes──► Real
//!                 │ no
//!                 ▼
//!        resolver.resolve_step(target)
//!          │          │           │
//!         Ok     DataUnav.    other error
//!          │          │           │
//!    cache+Real   Fallback       Err
//! ```
//!
//! The resolver always sees the exact target. The rounded key only groups
//! requests; an entry answers a request only when the request would resolve
//! to the same time step, so a hit and a bypass return the same field.
//!
//! # Example
//!
//! ```rust,ignore
//! use anomaly_resolver::{AnomalyService, ResolverConfig};
//!
//! let service = AnomalyService::from_config(&ResolverConfig::from_env())?;
//! let outcome = service.field(Utc::now(), Some(east_asia)).await?;
//! if !outcome.is_real() {
//!     println!("illustrative data: {}", outcome.reason().unwrap_or_default());
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sst_common::{BoundingBox, Granularity};
use tracing::{debug, instrument, warn};

use crate::cache::{CacheKey, FieldCache, FieldCacheStats};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::fallback::{FieldOutcome, SeriesOutcome, SyntheticFieldGenerator};
use crate::provider::{AnomalyProvider, HttpProvider};
use crate::resolver::AnomalyFieldResolver;
use crate::series::{RegionSeries, YearRange};

/// Caller-side orchestration around [`AnomalyFieldResolver`].
pub struct AnomalyService {
    resolver: AnomalyFieldResolver<Arc<dyn AnomalyProvider>>,
    cache: FieldCache,
    fallback: SyntheticFieldGenerator,
    granularity: Granularity,
}

impl AnomalyService {
    /// Create a service backed by the HTTP provider described in `config`.
    pub fn from_config(config: &ResolverConfig) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        let mut provider = HttpProvider::new(
            config.base_url.clone(),
            &config.dataset_id,
            config.variable.clone(),
            config.format,
            config.request_timeout(),
        )?;
        if let Some(query) = &config.query {
            provider = provider.with_query(query.clone());
        }

        Ok(Self::with_provider(Arc::new(provider), config))
    }

    /// Create a service around any provider.
    ///
    /// # Arguments
    /// * `provider` - Source of anomaly datasets
    /// * `config` - Variable name, cache, rounding, tie-break and fallback settings
    pub fn with_provider(provider: Arc<dyn AnomalyProvider>, config: &ResolverConfig) -> Self {
        let resolver = AnomalyFieldResolver::new(provider, config.variable.clone())
            .with_tie_break(config.tie_break);

        Self {
            resolver,
            cache: FieldCache::new(config.cache_capacity),
            fallback: SyntheticFieldGenerator::new(config.fallback_resolution_deg),
            granularity: config.cache_granularity,
        }
    }

    /// Resolve the field for `target` inside `bbox` (full domain when `None`).
    ///
    /// `DataUnavailable` is turned into an illustrative
    /// [`FieldOutcome::Fallback`]; `EmptyRegion` and `MalformedCoordinates`
    /// are returned as errors. Only observed fields are cached.
    #[instrument(skip(self), fields(provider = %self.resolver.provider().describe()))]
    pub async fn field(
        &self,
        target: DateTime<Utc>,
        bbox: Option<BoundingBox>,
    ) -> Result<FieldOutcome> {
        counter!("anomaly_requests_total").increment(1);

        let key = CacheKey::new(self.granularity.truncate(target), bbox.as_ref());

        if let Some(field) = self.cache.get(&key, target).await {
            counter!("anomaly_cache_hits_total").increment(1);
            debug!(requested = %target, resolved = %field.timestamp(), "Field cache hit");
            return Ok(FieldOutcome::Real(field));
        }
        counter!("anomaly_cache_misses_total").increment(1);

        match self.resolver.resolve_step(target, bbox.as_ref()).await {
            Ok(resolved) => {
                let field = Arc::new(resolved.field);
                self.cache
                    .insert(key, Arc::clone(&field), resolved.window)
                    .await;
                Ok(FieldOutcome::Real(field))
            }
            Err(err) if err.is_unavailable() => {
                warn!(error = %err, requested = %target, "Provider unavailable, serving illustrative field");
                counter!("anomaly_fallbacks_total").increment(1);

                let field = self.fallback.generate(target, bbox.as_ref())?;
                Ok(FieldOutcome::Fallback {
                    field: Arc::new(field),
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Area-mean anomaly series inside `bbox` over `years`.
    ///
    /// With `baseline_years`, means are rebased on the average of the first
    /// that many years. `DataUnavailable` gives an illustrative monthly
    /// series. Series are not cached.
    #[instrument(skip(self), fields(provider = %self.resolver.provider().describe()))]
    pub async fn series(
        &self,
        bbox: Option<BoundingBox>,
        years: YearRange,
        baseline_years: Option<u32>,
    ) -> Result<SeriesOutcome> {
        counter!("anomaly_series_requests_total").increment(1);

        let rebase = |series: RegionSeries| match baseline_years {
            Some(n) => series.rebased(n),
            None => series,
        };

        match self.resolver.series(bbox.as_ref(), years).await {
            Ok(points) => Ok(SeriesOutcome::Real(rebase(RegionSeries::new(
                bbox, years, points,
            )))),
            Err(err) if err.is_unavailable() => {
                warn!(error = %err, "Provider unavailable, serving illustrative series");
                counter!("anomaly_fallbacks_total").increment(1);

                let points = self.fallback.series(bbox.as_ref(), years)?;
                Ok(SeriesOutcome::Fallback {
                    series: rebase(RegionSeries::new(bbox, years, points)),
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn cache_stats(&self) -> FieldCacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn describe_provider(&self) -> String {
        self.resolver.provider().describe()
    }
}
