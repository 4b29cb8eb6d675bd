//! Remote provider over plain HTTP GET.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sst_common::BoundingBox;
use tracing::{debug, info, instrument};

use super::{decode_grid, decode_table, AnomalyProvider, FieldRequest};
use crate::array::Dataset;
use crate::error::{ResolverError, Result};

/// Wire format of a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// JSON grid with coordinates and variables.
    #[default]
    Grid,
    /// CSV table, one row per grid cell.
    Table,
}

impl PayloadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PayloadFormat::Grid => "json",
            PayloadFormat::Table => "csv",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(PayloadFormat::Grid),
            "csv" => Some(PayloadFormat::Table),
            _ => None,
        }
    }
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" | "json" => Ok(PayloadFormat::Grid),
            "table" | "csv" => Ok(PayloadFormat::Table),
            other => Err(format!("unknown payload format '{}'", other)),
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Grid => f.write_str("grid"),
            PayloadFormat::Table => f.write_str("table"),
        }
    }
}

/// A dataset identifier, bare (`oisst`) or suffix-qualified (`oisst.csv`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetId {
    name: String,
    format: Option<PayloadFormat>,
}

impl DatasetId {
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if let Some((name, ext)) = id.rsplit_once('.') {
            if let Some(format) = PayloadFormat::from_extension(ext) {
                return Self {
                    name: name.to_string(),
                    format: Some(format),
                };
            }
        }
        Self {
            name: id.to_string(),
            format: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format implied by the suffix, if there was one.
    pub fn format(&self) -> Option<PayloadFormat> {
        self.format
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{}.{}", self.name, format.extension()),
            None => f.write_str(&self.name),
        }
    }
}

/// ERDDAP griddap constraint for a `time x zlev x latitude x longitude` grid.
pub const DEFAULT_QUERY_TEMPLATE: &str = "{variable}[{time}][(0.0)][{lat}][{lon}]";

/// griddap index range selecting a whole axis.
const FULL_AXIS: &str = "0:1:last";

fn erddap_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn time_selector(request: &FieldRequest) -> String {
    match request.period {
        Some(period) => format!("({}):({})", erddap_time(period.start), erddap_time(period.end)),
        None => format!("({})", erddap_time(request.target)),
    }
}

fn lat_selector(bbox: Option<&BoundingBox>) -> String {
    match bbox {
        Some(b) if b.lat_min > -90.0 || b.lat_max < 90.0 => {
            format!("({}):({})", b.lat_min.max(-90.0), b.lat_max.min(90.0))
        }
        _ => FULL_AXIS.to_string(),
    }
}

fn lon_selector(bbox: Option<&BoundingBox>) -> String {
    // Boxes across the antimeridian are fetched over the full axis and cut locally
    match bbox.map(BoundingBox::longitude_ranges).as_deref() {
        Some([(lo, hi)]) if *lo > -180.0 || *hi < 180.0 => format!("({}):({})", lo, hi),
        _ => FULL_AXIS.to_string(),
    }
}

/// Fill the `{variable}`, `{time}`, `{lat}` and `{lon}` placeholders of a
/// query template from a request. Text without placeholders is kept as is.
///
/// `{time}` becomes `(t)` for a single field and `(start):(end)` for a
/// period. `{lat}`/`{lon}` become `(min):(max)`, or the whole axis when the
/// request has no box, the box spans the axis, or it crosses the antimeridian.
pub fn expand_query(template: &str, variable: &str, request: &FieldRequest) -> String {
    template
        .replace("{variable}", variable)
        .replace("{time}", &time_selector(request))
        .replace("{lat}", &lat_selector(request.bbox.as_ref()))
        .replace("{lon}", &lon_selector(request.bbox.as_ref()))
}

/// Fetches datasets from `{base_url}/{dataset}.{ext}[?{query}]`.
///
/// The query is a template expanded per request, see [`expand_query`].
pub struct HttpProvider {
    client: Client,
    base_url: String,
    dataset: DatasetId,
    format: PayloadFormat,
    query: Option<String>,
    variable: String,
}

impl HttpProvider {
    /// Create a provider.
    ///
    /// `format` applies only when `dataset` carries no `.json`/`.csv` suffix.
    pub fn new(
        base_url: impl Into<String>,
        dataset: &str,
        variable: impl Into<String>,
        format: PayloadFormat,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ResolverError::unavailable(format!("failed to build HTTP client: {}", e)))?;

        let dataset = DatasetId::parse(dataset);
        let format = dataset.format().unwrap_or(format);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dataset,
            format,
            query: None,
            variable: variable.into(),
        })
    }

    /// Append a query template (without the leading `?`).
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let query = query.trim_start_matches('?');
        self.query = (!query.is_empty()).then(|| query.to_string());
        self
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    fn dataset_url(&self) -> String {
        format!(
            "{}/{}.{}",
            self.base_url,
            self.dataset.name(),
            self.format.extension()
        )
    }

    /// URL with the query template unexpanded.
    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.dataset_url(), query),
            None => self.dataset_url(),
        }
    }

    /// URL fetched for `request`.
    pub fn url_for(&self, request: &FieldRequest) -> String {
        match &self.query {
            Some(query) => format!(
                "{}?{}",
                self.dataset_url(),
                expand_query(query, &self.variable, request)
            ),
            None => self.dataset_url(),
        }
    }

    fn decode(&self, body: &str) -> Result<Dataset> {
        match self.format {
            PayloadFormat::Grid => decode_grid(body, &self.variable),
            PayloadFormat::Table => decode_table(body, &self.variable),
        }
    }
}

#[async_trait]
impl AnomalyProvider for HttpProvider {
    #[instrument(skip(self, request), fields(dataset = %self.dataset, target = %request.target))]
    async fn open(&self, request: &FieldRequest) -> Result<Dataset> {
        let url = self.url_for(request);
        debug!(url = %url, "Fetching anomaly dataset");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::unavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let body = response.text().await?;
        let dataset = self.decode(&body)?;

        info!(
            bytes = body.len(),
            format = %self.format,
            "Fetched anomaly dataset"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.dataset_url())
    }
}
