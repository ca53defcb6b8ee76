//! Job polling
//!
//! GET /jobs/:job_id is read-only; jobs cannot be cancelled.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{error::ApiResult, models::Job, services, AppState};

/// GET /jobs/:job_id
pub async fn get_job(State(state): State<AppState>, Path(job_id): Path<Uuid>) -> ApiResult<Json<Job>> {
    Ok(Json(services::get_job(&state, job_id).await?))
}

/// Build job routes
pub fn job_routes() -> Router<AppState> {
    Router::new().route("/jobs/:job_id", get(get_job))
}
