//! Sea-surface-temperature anomaly field resolution.
//!
//! This crate turns a remote gridded anomaly dataset into a clean 2-D field
//! for a requested date and region. It hides the dataset's irregularities:
//!
//! - **Out-of-range dates**: clamped to the first/last available step
//! - **Extra vertical axis**: the first level (`zlev`/`depth`) is selected
//! - **Inconsistent naming**: `lat`/`latitude`, `time`/`date`, ... are normalized
//! - **Antimeridian boxes**: `lon_min > lon_max` is split at ±180 and stitched
//!
//! # Architecture
//!
//! ```text
//! HTTP request
//!      │
//!      ▼
//! AnomalyService::field(date, bbox)
//!      │
//!      ├─► Cache key: date rounded by Granularity + bbox
//!      │
//!      ├─► Check FieldCache (entry must cover the exact date)
//!      │         │
//!      │         ├─► Cache hit: return shared field
//!      │         │
//!      │         └─► Cache miss: AnomalyFieldResolver::resolve_step
//!      │                   │
//!      │                   ├─► AnomalyProvider::open (griddap CSV table / JSON grid)
//!      │                   │
//!      │                   └─► resolve_dataset (clamp, select, slice)
//!      │
//!      └─► DataUnavailable: SyntheticFieldGenerator (illustrative)
//!               │
//!               ▼
//!          FieldOutcome
//!
//! AnomalyService::series(bbox, years) ──► regional_series ──► RegionSeries
//! ```
//!
//! # Example
//!
//! ```ignore
//! use anomaly_resolver::{
//!     AnomalyFieldResolver, HttpProvider, PayloadFormat, DEFAULT_QUERY_TEMPLATE,
//! };
//! use sst_common::BoundingBox;
//!
//! let provider = HttpProvider::new(base_url, "ncdcOisst21Agg_LonPM180", "anom",
//!     PayloadFormat::Table, Duration::from_secs(30))?
//!     .with_query(DEFAULT_QUERY_TEMPLATE);
//! let resolver = AnomalyFieldResolver::new(provider, "anom");
//!
//! let east_asia = BoundingBox::new(5.0, 55.0, 105.0, 150.0);
//! let field = resolver.resolve(Utc::now(), Some(&east_asia)).await?;
//! println!("{:?} at {}", field.shape(), field.timestamp());
//! ```

pub mod array;
pub mod axes;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod fallback;
pub mod provider;
pub mod resolver;
pub mod series;
pub mod service;

// Re-export commonly used types at crate root
pub use array::{Coordinate, Dataset, Dimension, LabeledArray};
pub use axes::{classify, AxisRole};
pub use cache::{CacheKey, FieldCache, FieldCacheStats};
pub use config::ResolverConfig;
pub use error::{ResolverError, Result};
pub use export::{series_to_csv, to_csv, write_csv, write_series_csv, write_yearly_csv};
pub use fallback::{FieldOutcome, SeriesOutcome, SyntheticFieldGenerator};
pub use provider::{
    decode_grid, decode_table, expand_query, AnomalyProvider, DatasetId, FieldRequest,
    HttpProvider, PayloadFormat, StaticProvider, DEFAULT_QUERY_TEMPLATE,
};
pub use resolver::{
    resolve_dataset, resolve_dataset_step, time_steps, AnomalyFieldResolver, ResolvedField,
};
pub use series::{regional_series, RegionSeries, SeriesPoint, YearRange, YearlyMean};
pub use service::AnomalyService;
