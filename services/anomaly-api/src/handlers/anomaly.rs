//! Anomaly field handlers (JSON and CSV download).

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use anomaly_resolver::{to_csv, FieldOutcome};
use sst_common::{FieldStats, GriddedAnomalyField};

use super::common::{error_response, resolver_error_response, AnomalyParams};
use crate::state::AppState;

/// Response header naming where the data came from.
pub const DATA_SOURCE_HEADER: &str = "x-data-source";

/// JSON body of `GET /anomaly`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnomalyResponse {
    /// `observed` or `illustrative`.
    pub source: String,

    /// Set when the field is illustrative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Date the caller asked for.
    pub requested: DateTime<Utc>,

    /// Time step actually served.
    pub timestamp: DateTime<Utc>,

    /// `[latitudes, longitudes]`
    pub shape: [usize; 2],

    pub stats: Option<FieldStats>,

    pub latitudes: Vec<f64>,

    pub longitudes: Vec<f64>,

    /// One row per latitude; missing cells are `null`.
    pub values: Vec<Vec<Option<f32>>>,
}

impl AnomalyResponse {
    pub fn from_outcome(requested: DateTime<Utc>, outcome: &FieldOutcome) -> Self {
        let field = outcome.field();
        let (rows, cols) = field.shape();

        Self {
            source: outcome.label().to_string(),
            warning: outcome.reason().map(|reason| {
                format!(
                    "Observed data unavailable ({}); showing illustrative synthetic anomalies",
                    reason
                )
            }),
            requested,
            timestamp: field.timestamp(),
            shape: [rows, cols],
            stats: field.stats(),
            latitudes: field.latitudes().to_vec(),
            longitudes: field.longitudes().to_vec(),
            values: rows_with_nulls(field),
        }
    }
}

fn rows_with_nulls(field: &GriddedAnomalyField) -> Vec<Vec<Option<f32>>> {
    let cols = field.longitudes().len().max(1);
    field
        .values()
        .chunks(cols)
        .map(|row| {
            row.iter()
                .map(|&v| (!field.is_missing(v)).then_some(v))
                .collect()
        })
        .collect()
}

async fn resolve(
    state: &AppState,
    params: &AnomalyParams,
    endpoint: &'static str,
) -> Result<(DateTime<Utc>, FieldOutcome), Response> {
    metrics::counter!("anomaly_http_requests_total", "endpoint" => endpoint).increment(1);
    let (target, bbox) = params.parse()?;

    let outcome = state.service.field(target, bbox).await.map_err(|e| {
        error!(error = %e, "Failed to resolve anomaly field");
        resolver_error_response(&e)
    })?;

    info!(
        requested = %target,
        resolved = %outcome.field().timestamp(),
        source = outcome.label(),
        cells = outcome.field().len(),
        "Served anomaly field"
    );
    Ok((target, outcome))
}

fn source_header(outcome: &FieldOutcome) -> (&'static str, HeaderValue) {
    (DATA_SOURCE_HEADER, HeaderValue::from_static(outcome.label()))
}

/// GET /anomaly
pub async fn anomaly_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AnomalyParams>,
) -> Response {
    match resolve(&state, &params, "json").await {
        Ok((requested, outcome)) => (
            [source_header(&outcome)],
            Json(AnomalyResponse::from_outcome(requested, &outcome)),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /anomaly/csv - `lat,lon,anomaly` download
pub async fn anomaly_csv_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AnomalyParams>,
) -> Response {
    let (_, outcome) = match resolve(&state, &params, "csv").await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let body = match to_csv(outcome.field()) {
        Ok(body) => body,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NoApplicableCode",
                format!("Failed to write CSV: {}", e),
            )
        }
    };

    let disposition = format!(
        "attachment; filename=\"sst_anomaly_{}.csv\"",
        outcome.field().timestamp().format("%Y%m%d")
    );

    (
        StatusCode::OK,
        [
            ("content-type", HeaderValue::from_static("text/csv")),
            (
                "content-disposition",
                HeaderValue::from_str(&disposition)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            ),
            source_header(&outcome),
        ],
        body,
    )
        .into_response()
}
