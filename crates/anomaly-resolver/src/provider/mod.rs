//! Data providers for anomaly datasets.
//!
//! A provider is a black box that hands back a [`Dataset`] for a request. The
//! request's bbox, target and period let a remote source narrow what it sends.
//! Providers may still return a superset: the resolver does all clamping and
//! slicing itself.

mod grid_json;
mod http;
mod static_source;
mod table;

pub use grid_json::decode_grid;
pub use http::{expand_query, DatasetId, HttpProvider, PayloadFormat, DEFAULT_QUERY_TEMPLATE};
pub use static_source::StaticProvider;
pub use table::decode_table;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sst_common::{BoundingBox, TimeRange};

use crate::array::Dataset;
use crate::error::Result;

/// What the caller is about to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRequest {
    pub target: DateTime<Utc>,
    pub bbox: Option<BoundingBox>,

    /// Set when every step in a period is needed (regional series).
    pub period: Option<TimeRange>,
}

impl FieldRequest {
    /// A single field nearest to `target`.
    pub fn at(target: DateTime<Utc>, bbox: Option<BoundingBox>) -> Self {
        Self {
            target,
            bbox,
            period: None,
        }
    }

    /// All steps inside `period`.
    pub fn over(period: TimeRange, bbox: Option<BoundingBox>) -> Self {
        Self {
            target: period.start,
            bbox,
            period: Some(period),
        }
    }
}

/// Source of gridded anomaly data.
#[async_trait]
pub trait AnomalyProvider: Send + Sync {
    /// Fetch the dataset for a request.
    ///
    /// Transport failures and undecodable payloads must be reported as
    /// [`crate::ResolverError::DataUnavailable`].
    async fn open(&self, request: &FieldRequest) -> Result<Dataset>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<P: AnomalyProvider + ?Sized> AnomalyProvider for Arc<P> {
    async fn open(&self, request: &FieldRequest) -> Result<Dataset> {
        (**self).open(request).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
