//! Provider serving a preloaded dataset.

use async_trait::async_trait;

use super::{AnomalyProvider, FieldRequest};
use crate::array::Dataset;
use crate::error::Result;

/// Serves the same in-memory dataset for every request.
///
/// Useful for offline runs against a previously downloaded grid.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    dataset: Dataset,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }
}

#[async_trait]
impl AnomalyProvider for StaticProvider {
    async fn open(&self, _request: &FieldRequest) -> Result<Dataset> {
        Ok(self.dataset.clone())
    }

    fn describe(&self) -> String {
        format!("static:{}", self.name)
    }
}
