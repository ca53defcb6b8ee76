//! Job runners and model services
//!
//! Each submit function validates its input, persists a queued [`Job`] and
//! spawns one background task. Stage errors end up as the job's failure
//! message; input errors are returned before a job exists.
//!
//! [`Job`]: crate::models::Job

pub mod clean;
pub mod datasets;
pub mod evaluate;
pub mod jobs;
pub mod keywords;
pub mod label;
pub mod predict;
pub mod storage;
pub mod train;

pub use clean::submit_clean_job;
pub use datasets::{get_dataset, upload_dataset};
pub use evaluate::{evaluate_model, evaluate_on_dataset, EvaluationReport};
pub use jobs::{get_job, JobHandle};
pub use label::submit_label_job;
pub use predict::{load_model, predict_dataset, predict_many, predict_one, DatasetPredictions};
pub use storage::{FsObjectStore, ObjectStore};
pub use train::submit_train_job;

use crate::classifiers::ModelError;
use crate::cleaning::CleaningError;
use crate::clustering::ClusteringError;
use crate::labeling::LabelingError;
use crate::models::{Dataset, JobError, SourceFile};
use crate::table::{read_csv, Table, TableError};
use crate::AppState;
use thiserror::Error;
use uuid::Uuid;

/// Any failure inside a service call or background job
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(Uuid),

    #[error("Model not found: {0}")]
    ModelNotFound(Uuid),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Cleaning(#[from] CleaningError),

    #[error(transparent)]
    Labeling(#[from] LabelingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Common(#[from] sentiprep_common::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Whether the caller supplied bad input (as opposed to a stage failing)
    pub fn is_input_error(&self) -> bool {
        match self {
            ServiceError::InvalidInput(_) => true,
            ServiceError::Table(_) => true,
            ServiceError::Cleaning(CleaningError::MissingColumn(_)) => true,
            ServiceError::Labeling(
                LabelingError::InvalidAnnotation { .. }
                | LabelingError::NoKeywords
                | LabelingError::NoTextColumn
                | LabelingError::Clustering(
                    ClusteringError::InvalidClusterCount(_)
                    | ClusteringError::InvalidParameter(_)
                    | ClusteringError::TooFewSamples { .. },
                ),
            ) => true,
            ServiceError::Model(
                ModelError::UnknownAlgorithm(_)
                | ModelError::InvalidHyperparameters(_)
                | ModelError::EmptyTrainingSet
                | ModelError::TooFewRows { .. },
            ) => true,
            ServiceError::Common(sentiprep_common::Error::InvalidInput(_)) => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::DatasetNotFound(_)
                | ServiceError::ModelNotFound(_)
                | ServiceError::JobNotFound(_)
                | ServiceError::Common(sentiprep_common::Error::NotFound(_))
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) async fn load_dataset(state: &AppState, dataset_id: Uuid) -> ServiceResult<Dataset> {
    crate::db::datasets::get_dataset(&state.db, dataset_id)
        .await?
        .ok_or(ServiceError::DatasetNotFound(dataset_id))
}

/// Download and parse one stored dataset file
pub(crate) async fn load_table(state: &AppState, source: &SourceFile) -> ServiceResult<Table> {
    let bytes = state.store.download(&source.path).await?;
    let has_header = source.has_header;
    let table = tokio::task::spawn_blocking(move || read_csv(&bytes, has_header, None)).await??;
    tracing::debug!(path = %source.path, rows = table.len(), columns = table.width(), "Loaded table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(ServiceError::InvalidInput("x".into()).is_input_error());
        assert!(ServiceError::Model(ModelError::UnknownAlgorithm("forest".into())).is_input_error());
        assert!(!ServiceError::Model(ModelError::NotFitted).is_input_error());
        assert!(ServiceError::DatasetNotFound(Uuid::nil()).is_not_found());
        assert!(!ServiceError::DatasetNotFound(Uuid::nil()).is_input_error());
        assert!(ServiceError::Common(sentiprep_common::Error::NotFound("x".into())).is_not_found());
    }
}
