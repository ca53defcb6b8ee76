//! Labeling jobs

use super::jobs::{discard_object, finish_job, launch, report_progress, start_job, JobHandle, JobOutput};
use super::keywords::load_default_keywords;
use super::{load_dataset, load_table, ServiceError, ServiceResult};
use crate::clustering::ClusteringError;
use crate::db;
use crate::labeling::{
    label_table_by_clusters, label_table_by_keywords, label_table_manually, Annotation,
    ClusteringAlgorithm, ClusteringHyperparams, KeywordLabeler, LabelingError, LabelingSummary,
    Polarity,
};
use crate::models::{Dataset, DatasetStatus, Job, JobKind, LabelRequest, Labeling};
use crate::table::{write_csv, Table};
use crate::AppState;
use sentiprep_common::time;
use tracing::info;
use uuid::Uuid;

/// Object path of the file a labeling job writes
pub fn labeled_path(dataset_id: Uuid, job_id: Uuid) -> String {
    format!("labeled/{}_{}.csv", dataset_id, job_id)
}

/// Reject requests that can never succeed, before a job is created
fn validate(request: &LabelRequest) -> ServiceResult<()> {
    match request {
        LabelRequest::Manual { annotations, .. } => {
            if let Some(bad) = annotations.iter().find(|a| Polarity::from_value(a.label).is_none()) {
                return Err(LabelingError::InvalidAnnotation {
                    row_index: bad.row_index,
                    label: bad.label,
                }
                .into());
            }
        }
        LabelRequest::Naive { keywords: Some(map) } => {
            if KeywordLabeler::new(map).is_empty() {
                return Err(LabelingError::NoKeywords.into());
            }
        }
        LabelRequest::Naive { keywords: None } => {}
        LabelRequest::Clustering { hyperparameters, .. } => {
            if hyperparameters.n_clusters == Some(0) {
                return Err(LabelingError::from(ClusteringError::InvalidClusterCount(0)).into());
            }
            if hyperparameters.min_samples == Some(0) {
                return Err(ServiceError::InvalidInput("min_samples must be at least 1".to_string()));
            }
            if let Some(eps) = hyperparameters.eps.filter(|e| !(*e > 0.0)) {
                return Err(ServiceError::InvalidInput(format!("eps must be positive, got {}", eps)));
            }
        }
    }
    Ok(())
}

/// Queue a labeling run over the cleaned file (or the original upload)
pub async fn submit_label_job(state: &AppState, dataset_id: Uuid, request: LabelRequest) -> ServiceResult<JobHandle> {
    validate(&request)?;
    let dataset = load_dataset(state, dataset_id).await?;
    let job = Job::new(JobKind::Label, dataset.dataset_id, dataset.session_id).with_method(request.method());
    let runner = run_label_job(state.clone(), job.clone(), dataset, request);
    launch(state, job, runner).await
}

async fn run_label_job(state: AppState, mut job: Job, dataset: Dataset, request: LabelRequest) -> Job {
    let outcome = match start_job(&state, &mut job).await {
        Ok(()) => label_dataset(&state, &mut job, &dataset, request).await,
        Err(e) => Err(e),
    };
    finish_job(&state, job, outcome, DatasetStatus::LabelingFailed).await
}

/// Request with the keyword store consulted where needed
enum Labeler {
    Manual {
        annotations: Vec<Annotation>,
        stop_early: bool,
    },
    Keywords(KeywordLabeler),
    Clusters {
        algorithm: ClusteringAlgorithm,
        hyperparameters: ClusteringHyperparams,
    },
}

impl Labeler {
    async fn resolve(state: &AppState, request: LabelRequest) -> ServiceResult<Self> {
        Ok(match request {
            LabelRequest::Manual {
                annotations,
                stop_early,
            } => Labeler::Manual {
                annotations,
                stop_early,
            },
            LabelRequest::Naive { keywords } => {
                let map = match keywords {
                    Some(map) => map,
                    None => load_default_keywords(state.store.as_ref(), &state.settings.keywords).await,
                };
                let labeler = KeywordLabeler::new(&map);
                if labeler.is_empty() {
                    return Err(LabelingError::NoKeywords.into());
                }
                Labeler::Keywords(labeler)
            }
            LabelRequest::Clustering {
                algorithm,
                hyperparameters,
            } => Labeler::Clusters {
                algorithm,
                hyperparameters,
            },
        })
    }

    fn apply(&self, table: &mut Table) -> Result<LabelingSummary, LabelingError> {
        Ok(match self {
            Labeler::Manual {
                annotations,
                stop_early,
            } => LabelingSummary::Manual(label_table_manually(table, annotations, *stop_early)?),
            Labeler::Keywords(labeler) => LabelingSummary::Keyword(label_table_by_keywords(table, labeler)?),
            Labeler::Clusters {
                algorithm,
                hyperparameters,
            } => LabelingSummary::Clusters(label_table_by_clusters(table, *algorithm, hyperparameters)?),
        })
    }
}

async fn label_dataset(
    state: &AppState,
    job: &mut Job,
    dataset: &Dataset,
    request: LabelRequest,
) -> ServiceResult<JobOutput> {
    let method = request.method();
    let hyperparameters = request.hyperparameters();

    let mut table = load_table(state, &dataset.labeling_source()).await?;
    let labeler = Labeler::resolve(state, request).await?;
    report_progress(state, job, 20, "Loaded dataset").await?;

    let (summary, bytes, rows) = tokio::task::spawn_blocking(move || -> ServiceResult<_> {
        let summary = labeler.apply(&mut table)?;
        let bytes = write_csv(&table)?;
        Ok((summary, bytes, table.len()))
    })
    .await??;
    report_progress(state, job, 80, "Labeled rows").await?;

    let path = labeled_path(dataset.dataset_id, job.job_id);
    state.store.upload(&path, bytes).await?;

    let labeling = Labeling {
        labeling_id: Uuid::new_v4(),
        dataset_id: dataset.dataset_id,
        session_id: dataset.session_id,
        method: method.to_string(),
        hyperparameters,
        summary: summary.clone(),
        labeled_file: path.clone(),
        created_at: time::now(),
    };
    if let Err(e) = db::labelings::record_labeling(&state.db, &labeling).await {
        discard_object(state, &path).await;
        return Err(e.into());
    }
    info!(
        dataset_id = %dataset.dataset_id,
        labeling_id = %labeling.labeling_id,
        method,
        rows,
        "Labeling recorded"
    );

    Ok(JobOutput {
        result_file: Some(path),
        result: serde_json::to_value(&summary).map_err(sentiprep_common::Error::from)?,
        message: format!("Labeled {} rows with {} labeling", rows, method),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::KeywordMap;

    #[test]
    fn test_validation_rejects_bad_annotations() {
        let request = LabelRequest::Manual {
            annotations: vec![Annotation { row_index: 0, label: 3 }],
            stop_early: false,
        };
        let err = validate(&request).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_validation_rejects_empty_keyword_map() {
        let mut map = KeywordMap::new();
        map.insert("pos".into(), vec!["  ".into()]);
        let err = validate(&LabelRequest::Naive { keywords: Some(map) }).unwrap_err();
        assert!(matches!(err, ServiceError::Labeling(LabelingError::NoKeywords)));
        assert!(validate(&LabelRequest::Naive { keywords: None }).is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_clusters() {
        let request = LabelRequest::Clustering {
            algorithm: ClusteringAlgorithm::Kmeans,
            hyperparameters: ClusteringHyperparams {
                n_clusters: Some(0),
                ..Default::default()
            },
        };
        assert!(validate(&request).unwrap_err().is_input_error());
    }
}
