//! Prediction with stored models

use super::{load_dataset, load_table, ServiceError, ServiceResult};
use crate::classifiers::Classifier;
use crate::db;
use crate::labeling::LabelingError;
use crate::models::{ModelArtifact, TrainedModel};
use crate::table::detect_text_column;
use crate::AppState;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// A model record with its artifact
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub record: TrainedModel,
    pub artifact: ModelArtifact,
}

pub async fn load_model(state: &AppState, model_id: Uuid) -> ServiceResult<LoadedModel> {
    let record = db::trained_models::get_trained_model(&state.db, model_id)
        .await?
        .ok_or(ServiceError::ModelNotFound(model_id))?;
    let bytes = state.store.download(&record.model_file).await?;
    let artifact = ModelArtifact::from_bytes(&bytes).map_err(sentiprep_common::Error::from)?;
    debug!(model_id = %model_id, algorithm = %artifact.algorithm, "Loaded model artifact");
    Ok(LoadedModel { record, artifact })
}

async fn run_model(model: LoadedModel, texts: Vec<String>) -> ServiceResult<Vec<i64>> {
    let predictions = tokio::task::spawn_blocking(move || model.artifact.model.predict(&texts)).await??;
    Ok(predictions)
}

pub async fn predict_one(state: &AppState, model_id: Uuid, text: String) -> ServiceResult<i64> {
    let model = load_model(state, model_id).await?;
    let predictions = run_model(model, vec![text]).await?;
    predictions
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::InvalidInput("No prediction produced".to_string()))
}

pub async fn predict_many(state: &AppState, model_id: Uuid, texts: Vec<String>) -> ServiceResult<Vec<i64>> {
    let model = load_model(state, model_id).await?;
    run_model(model, texts).await
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetPredictions {
    pub dataset_id: Uuid,
    /// Column of the uploaded file that was classified
    pub text_column: usize,
    /// One prediction per row, in file order
    pub predictions: Vec<i64>,
}

/// Classify the text column of a dataset's uploaded file
pub async fn predict_dataset(state: &AppState, model_id: Uuid, dataset_id: Uuid) -> ServiceResult<DatasetPredictions> {
    let model = load_model(state, model_id).await?;
    let dataset = load_dataset(state, dataset_id).await?;
    let table = load_table(state, &dataset.original_source()).await?;
    let text_column = detect_text_column(&table, &[]).ok_or(LabelingError::NoTextColumn)?;
    let texts = table.column_text(text_column)?;

    let predictions = run_model(model, texts).await?;
    Ok(DatasetPredictions {
        dataset_id,
        text_column,
        predictions,
    })
}
