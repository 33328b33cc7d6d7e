pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod services;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
