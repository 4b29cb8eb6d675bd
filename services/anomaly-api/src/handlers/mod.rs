//! HTTP request handlers for the anomaly API.

pub mod anomaly;
pub mod common;
pub mod health;
pub mod regions;
pub mod series;
