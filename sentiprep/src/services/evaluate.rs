//! Model evaluation

use super::predict::load_model;
use super::{load_dataset, load_table, ServiceError, ServiceResult};
use crate::classifiers::{classification_metrics, Classifier};
use crate::db;
use crate::labeling::target::labeled_examples;
use crate::models::TrainedModel;
use crate::AppState;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Metrics recorded when the model was trained
pub async fn evaluate_model(state: &AppState, model_id: Uuid) -> ServiceResult<TrainedModel> {
    db::trained_models::get_trained_model(&state.db, model_id)
        .await?
        .ok_or(ServiceError::ModelNotFound(model_id))
}

/// Scores of a model against the labels of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub model_id: Uuid,
    pub dataset_id: Uuid,
    /// Rows scored
    pub rows: usize,
    /// Rows without a polarity target
    pub skipped_rows: usize,
    pub labels: Vec<i64>,
    pub confusion_matrix: Vec<Vec<u64>>,
    pub accuracy: f64,
    pub error_rate: f64,
    pub precision: f64,
}

/// Predict every labeled row of a dataset and compare with column 0
pub async fn evaluate_on_dataset(state: &AppState, model_id: Uuid, dataset_id: Uuid) -> ServiceResult<EvaluationReport> {
    let model = load_model(state, model_id).await?;
    let dataset = load_dataset(state, dataset_id).await?;
    let table = load_table(state, &dataset.training_source()).await?;
    let examples = labeled_examples(&table)?;
    if examples.labels.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "Dataset {} has no labeled rows",
            dataset_id
        )));
    }

    let rows = examples.labels.len();
    let skipped_rows = examples.skipped;
    let metrics = tokio::task::spawn_blocking(move || -> ServiceResult<_> {
        let predictions = model.artifact.model.predict(&examples.texts)?;
        Ok(classification_metrics(&examples.labels, &predictions)?)
    })
    .await??;

    info!(
        model_id = %model_id,
        dataset_id = %dataset_id,
        rows,
        accuracy = metrics.accuracy,
        "Model evaluated on dataset"
    );
    Ok(EvaluationReport {
        model_id,
        dataset_id,
        rows,
        skipped_rows,
        labels: metrics.labels,
        confusion_matrix: metrics.confusion_matrix,
        accuracy: metrics.accuracy,
        error_rate: metrics.error_rate,
        precision: metrics.precision,
    })
}
