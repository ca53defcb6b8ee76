//! Prediction and evaluation with trained models
//!
//! POST /models/:model_id/predict, GET|POST /models/:model_id/evaluate

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{EvaluateRequest, PredictInput, PredictRequest, TrainedModel},
    services::{self, DatasetPredictions, EvaluationReport},
    AppState,
};

/// POST /models/:model_id/predict response, shaped after the request
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    One { model_id: Uuid, prediction: i64 },
    Many { model_id: Uuid, predictions: Vec<i64> },
    Dataset {
        model_id: Uuid,
        #[serde(flatten)]
        result: DatasetPredictions,
    },
}

/// POST /models/:model_id/predict
///
/// Exactly one of `text`, `texts` or `dataset_id` must be given.
pub async fn predict(
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<Json<PredictResponse>> {
    let input = request.into_input().ok_or_else(|| {
        ApiError::BadRequest("Provide exactly one of text, texts or dataset_id".to_string())
    })?;

    let response = match input {
        PredictInput::One(text) => PredictResponse::One {
            model_id,
            prediction: services::predict_one(&state, model_id, text).await?,
        },
        PredictInput::Many(texts) => PredictResponse::Many {
            model_id,
            predictions: services::predict_many(&state, model_id, texts).await?,
        },
        PredictInput::Dataset(dataset_id) => PredictResponse::Dataset {
            model_id,
            result: services::predict_dataset(&state, model_id, dataset_id).await?,
        },
    };
    Ok(Json(response))
}

/// GET /models/:model_id/evaluate
///
/// Validation metrics recorded at training time.
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
) -> ApiResult<Json<TrainedModel>> {
    Ok(Json(services::evaluate_model(&state, model_id).await?))
}

/// POST /models/:model_id/evaluate
pub async fn evaluate_on_dataset(
    State(state): State<AppState>,
    Path(model_id): Path<Uuid>,
    Json(request): Json<EvaluateRequest>,
) -> ApiResult<Json<EvaluationReport>> {
    let report = services::evaluate_on_dataset(&state, model_id, request.dataset_id).await?;
    Ok(Json(report))
}

/// Build model routes
pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/models/:model_id/predict", post(predict))
        .route(
            "/models/:model_id/evaluate",
            get(get_evaluation).post(evaluate_on_dataset),
        )
}
