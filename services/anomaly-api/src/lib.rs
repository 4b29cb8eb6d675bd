//! Anomaly API Service Library
//!
//! HTTP server exposing resolved SST anomaly fields and regional anomaly
//! series as JSON and CSV, plus the named region presets.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Anomaly fields
        .route("/anomaly", get(handlers::anomaly::anomaly_handler))
        .route("/anomaly/csv", get(handlers::anomaly::anomaly_csv_handler))
        // Regional series
        .route("/series", get(handlers::series::series_handler))
        .route("/series/csv", get(handlers::series::series_csv_handler))
        // Region presets
        .route("/regions", get(handlers::regions::regions_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
