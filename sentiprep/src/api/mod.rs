//! HTTP API handlers
//!
//! Thin wrappers over [`crate::services`]: job submission, job polling and
//! model queries.

pub mod datasets;
pub mod health;
pub mod jobs;
pub mod models;

pub use datasets::dataset_routes;
pub use health::health_routes;
pub use jobs::job_routes;
pub use models::model_routes;
