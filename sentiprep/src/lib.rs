//! sentiprep library interface
//!
//! Sentiment dataset preparation: cleaning, labeling and training of text
//! classifiers, run as background jobs behind a small HTTP API.

pub mod api;
pub mod classifiers;
pub mod cleaning;
pub mod clustering;
pub mod config;
pub mod db;
pub mod error;
pub mod labeling;
pub mod models;
pub mod services;
pub mod table;

pub use crate::error::{ApiError, ApiResult};

use crate::config::{Capabilities, ServiceSettings};
use crate::services::ObjectStore;
use axum::Router;
use chrono::{DateTime, Utc};
use sentiprep_common::time;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers and jobs
#[derive(Debug, Clone)]
pub struct AppState {
    /// Metadata store
    pub db: SqlitePool,
    /// Dataset files, keyword lists and model artifacts
    pub store: Arc<dyn ObjectStore>,
    /// Optional features resolved at startup
    pub capabilities: Capabilities,
    pub settings: ServiceSettings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            capabilities: Capabilities::none(),
            settings: ServiceSettings::default(),
            startup_time: time::now(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::dataset_routes())
        .merge(api::job_routes())
        .merge(api::model_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
