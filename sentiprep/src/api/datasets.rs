//! Dataset upload and job submission
//!
//! POST /sessions/:session_id/datasets, POST /datasets/:dataset_id/{clean,label,train}

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    cleaning::CleaningOptions,
    error::ApiResult,
    models::{Dataset, Job, JobStatus, LabelRequest, Labeling, TrainRequest, TrainedModel},
    services::{self, JobHandle},
    AppState,
};

/// Response to an accepted job
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Id the trained model will have (training jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
}

impl From<JobHandle> for SubmitJobResponse {
    fn from(handle: JobHandle) -> Self {
        Self {
            job_id: handle.job.job_id,
            status: handle.job.status,
            model_id: handle.job.model_id,
        }
    }
}

/// POST /sessions/:session_id/datasets
///
/// Body is the raw CSV file, header row first.
pub async fn upload_dataset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Dataset>)> {
    let dataset = services::upload_dataset(&state, session_id, body.to_vec()).await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

/// GET /sessions/:session_id/datasets
pub async fn list_session_datasets(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Dataset>>> {
    let datasets = crate::db::datasets::list_session_datasets(&state.db, session_id).await?;
    Ok(Json(datasets))
}

/// GET /sessions/:session_id/models
pub async fn list_session_models(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TrainedModel>>> {
    let models = crate::db::trained_models::list_session_models(&state.db, session_id).await?;
    Ok(Json(models))
}

/// GET /datasets/:dataset_id
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> ApiResult<Json<Dataset>> {
    Ok(Json(services::get_dataset(&state, dataset_id).await?))
}

/// GET /datasets/:dataset_id/jobs
pub async fn list_dataset_jobs(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Job>>> {
    services::get_dataset(&state, dataset_id).await?;
    let jobs = crate::db::jobs::list_dataset_jobs(&state.db, dataset_id).await?;
    Ok(Json(jobs))
}

/// GET /datasets/:dataset_id/labelings
pub async fn list_dataset_labelings(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Labeling>>> {
    services::get_dataset(&state, dataset_id).await?;
    let labelings = crate::db::labelings::list_dataset_labelings(&state.db, dataset_id).await?;
    Ok(Json(labelings))
}

/// POST /datasets/:dataset_id/clean
pub async fn clean_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Json(options): Json<CleaningOptions>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let handle = services::submit_clean_job(&state, dataset_id, options).await?;
    Ok((StatusCode::ACCEPTED, Json(handle.into())))
}

/// POST /datasets/:dataset_id/label
pub async fn label_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Json(request): Json<LabelRequest>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let handle = services::submit_label_job(&state, dataset_id, request).await?;
    Ok((StatusCode::ACCEPTED, Json(handle.into())))
}

/// POST /datasets/:dataset_id/train
pub async fn train_model(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
    Json(request): Json<TrainRequest>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let handle = services::submit_train_job(&state, dataset_id, request).await?;
    Ok((StatusCode::ACCEPTED, Json(handle.into())))
}

/// Build dataset routes
pub fn dataset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions/:session_id/datasets",
            post(upload_dataset).get(list_session_datasets),
        )
        .route("/sessions/:session_id/models", get(list_session_models))
        .route("/datasets/:dataset_id", get(get_dataset))
        .route("/datasets/:dataset_id/jobs", get(list_dataset_jobs))
        .route("/datasets/:dataset_id/labelings", get(list_dataset_labelings))
        .route("/datasets/:dataset_id/clean", post(clean_dataset))
        .route("/datasets/:dataset_id/label", post(label_dataset))
        .route("/datasets/:dataset_id/train", post(train_model))
}
