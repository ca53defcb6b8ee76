//! Training jobs
//!
//! Reads the most processed file of a dataset (labeled, else cleaned, else
//! original), keeps the rows with a polarity target, splits them stratified
//! and fits the requested algorithm on the training side. The validation
//! side produces the stored metrics.

use super::jobs::{discard_object, finish_job, launch, report_progress, start_job, JobHandle, JobOutput};
use super::keywords::{load_default_keywords, NEGATIVES, POSITIVES};
use super::{load_dataset, load_table, ServiceResult};
use crate::classifiers::split::DEFAULT_SPLIT_SEED;
use crate::classifiers::{
    classification_metrics, stratified_split, AlgorithmConfig, ClassificationMetrics, Classifier,
    ModelError, NaiveAutomaticParams,
};
use crate::db;
use crate::labeling::target::labeled_examples;
use crate::models::{artifact_path, Dataset, DatasetStatus, Job, JobKind, ModelArtifact, TrainRequest, TrainedModel};
use crate::AppState;
use sentiprep_common::time;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Queue a training run; the new model's id is on the returned job
pub async fn submit_train_job(state: &AppState, dataset_id: Uuid, request: TrainRequest) -> ServiceResult<JobHandle> {
    let config = request.validate()?;
    let dataset = load_dataset(state, dataset_id).await?;

    let model_id = Uuid::new_v4();
    let job = Job::new(JobKind::Train, dataset.dataset_id, dataset.session_id)
        .with_method(config.name())
        .with_model_id(model_id);
    let runner = run_train_job(state.clone(), job.clone(), dataset, request, config, model_id);
    launch(state, job, runner).await
}

async fn run_train_job(
    state: AppState,
    mut job: Job,
    dataset: Dataset,
    request: TrainRequest,
    config: AlgorithmConfig,
    model_id: Uuid,
) -> Job {
    let outcome = match start_job(&state, &mut job).await {
        Ok(()) => train_model(&state, &mut job, &dataset, &request, config, model_id).await,
        Err(e) => Err(e),
    };
    finish_job(&state, job, outcome, DatasetStatus::TrainingFailed).await
}

/// Fill keyword lists the request left out from the keyword store
async fn with_default_keywords(state: &AppState, config: AlgorithmConfig) -> AlgorithmConfig {
    match config {
        AlgorithmConfig::NaiveAutomatic(params) if params.positives.is_none() || params.negatives.is_none() => {
            let mut defaults = load_default_keywords(state.store.as_ref(), &state.settings.keywords).await;
            AlgorithmConfig::NaiveAutomatic(NaiveAutomaticParams {
                positives: params.positives.or_else(|| defaults.remove(POSITIVES)),
                negatives: params.negatives.or_else(|| defaults.remove(NEGATIVES)),
            })
        }
        other => other,
    }
}

#[derive(Debug)]
struct Fitted {
    artifact: ModelArtifact,
    metrics: ClassificationMetrics,
}

fn fit_and_score(
    config: &AlgorithmConfig,
    texts: &[String],
    labels: &[i64],
    test_size: f64,
) -> Result<Fitted, ModelError> {
    let split = stratified_split(labels, test_size, DEFAULT_SPLIT_SEED)?;
    let pick = |indexes: &[usize]| -> (Vec<String>, Vec<i64>) {
        indexes.iter().map(|&i| (texts[i].clone(), labels[i])).unzip()
    };
    let (train_texts, train_labels) = pick(&split.train);
    let (val_texts, val_labels) = pick(&split.validation);

    let model = config.train(&train_texts, &train_labels)?;
    let predictions = model.predict(&val_texts)?;
    let metrics = classification_metrics(&val_labels, &predictions)?;

    Ok(Fitted {
        artifact: ModelArtifact {
            algorithm: config.name().to_string(),
            hyperparameters: config.hyperparameters(),
            model,
            train_size: train_texts.len(),
            val_size: val_texts.len(),
            metrics: metrics.clone(),
        },
        metrics,
    })
}

async fn train_model(
    state: &AppState,
    job: &mut Job,
    dataset: &Dataset,
    request: &TrainRequest,
    config: AlgorithmConfig,
    model_id: Uuid,
) -> ServiceResult<JobOutput> {
    let table = load_table(state, &dataset.training_source()).await?;
    let examples = labeled_examples(&table)?;
    if examples.labels.is_empty() {
        return Err(ModelError::EmptyTrainingSet.into());
    }
    info!(
        dataset_id = %dataset.dataset_id,
        rows = examples.labels.len(),
        skipped = examples.skipped,
        "Training examples extracted"
    );
    report_progress(state, job, 20, "Loaded training data").await?;

    let config = with_default_keywords(state, config).await;
    let test_size = request.test_size;
    let skipped = examples.skipped;
    let Fitted { artifact, metrics } = tokio::task::spawn_blocking(move || {
        fit_and_score(&config, &examples.texts, &examples.labels, test_size)
    })
    .await??;
    report_progress(state, job, 80, "Model trained").await?;

    let path = artifact_path(model_id);
    let bytes = artifact.to_bytes().map_err(sentiprep_common::Error::from)?;
    state.store.upload(&path, bytes).await?;

    let record = TrainedModel {
        model_id,
        model_name: request.model_name(),
        session_id: dataset.session_id,
        dataset_id: dataset.dataset_id,
        algorithm: artifact.algorithm.clone(),
        hyperparameters: artifact.hyperparameters.clone(),
        model_file: path.clone(),
        train_size: artifact.train_size,
        val_size: artifact.val_size,
        metrics: metrics.clone(),
        created_at: time::now(),
    };
    if let Err(e) = db::trained_models::insert_trained_model(&state.db, &record).await {
        discard_object(state, &path).await;
        return Err(e.into());
    }
    if let Err(e) = db::datasets::set_status(&state.db, dataset.dataset_id, DatasetStatus::Trained).await {
        warn!(dataset_id = %dataset.dataset_id, error = %e, "Failed to record dataset training status");
    }
    info!(
        model_id = %model_id,
        algorithm = %record.algorithm,
        accuracy = metrics.accuracy,
        "Model stored"
    );

    Ok(JobOutput {
        result_file: Some(path),
        result: json!({
            "model_id": model_id,
            "model_name": record.model_name,
            "algorithm": record.algorithm,
            "train_size": record.train_size,
            "val_size": record.val_size,
            "skipped_rows": skipped,
            "metrics": metrics,
        }),
        message: format!("Trained {} with accuracy {:.4}", record.algorithm, metrics.accuracy),
    })
}
