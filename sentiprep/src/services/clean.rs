//! Cleaning jobs

use super::jobs::{discard_object, finish_job, launch, report_progress, start_job, JobHandle, JobOutput};
use super::{load_dataset, load_table, ServiceResult};
use crate::cleaning::{CleaningOptions, CleaningPipeline, CleaningReport};
use crate::db;
use crate::models::{Dataset, DatasetStatus, Job, JobKind};
use crate::table::write_csv;
use crate::AppState;
use uuid::Uuid;

/// Object path of the file a cleaning job writes
///
/// Keyed by job so a failed run never overwrites the file the dataset
/// currently points at.
pub fn cleaned_path(dataset_id: Uuid, job_id: Uuid) -> String {
    format!("cleaned/{}_{}.csv", dataset_id, job_id)
}

/// Queue a cleaning run of the dataset's original upload
pub async fn submit_clean_job(
    state: &AppState,
    dataset_id: Uuid,
    options: CleaningOptions,
) -> ServiceResult<JobHandle> {
    let dataset = load_dataset(state, dataset_id).await?;
    let job = Job::new(JobKind::Clean, dataset.dataset_id, dataset.session_id);
    let runner = run_clean_job(state.clone(), job.clone(), dataset, options);
    launch(state, job, runner).await
}

async fn run_clean_job(state: AppState, mut job: Job, dataset: Dataset, options: CleaningOptions) -> Job {
    let outcome = match start_job(&state, &mut job).await {
        Ok(()) => clean_dataset(&state, &mut job, &dataset, options).await,
        Err(e) => Err(e),
    };
    finish_job(&state, job, outcome, DatasetStatus::CleaningFailed).await
}

async fn clean_dataset(
    state: &AppState,
    job: &mut Job,
    dataset: &Dataset,
    options: CleaningOptions,
) -> ServiceResult<JobOutput> {
    let table = load_table(state, &dataset.original_source()).await?;
    report_progress(state, job, 20, "Loaded dataset").await?;

    let capabilities = state.capabilities.clone();
    let policy = state.settings.missing_columns;
    let (report, bytes, options) = tokio::task::spawn_blocking(move || -> ServiceResult<_> {
        let report: CleaningReport = CleaningPipeline::new(&options)
            .with_language_detector(capabilities.language_detector())
            .with_missing_column_policy(policy)
            .run(table)?;
        let bytes = write_csv(&report.table)?;
        Ok((report, bytes, options))
    })
    .await??;
    report_progress(state, job, 70, "Cleaned rows").await?;

    let path = cleaned_path(dataset.dataset_id, job.job_id);
    state.store.upload(&path, bytes).await?;
    if let Err(e) =
        db::datasets::set_cleaned(&state.db, dataset.dataset_id, &path, options.keep_columns.as_ref()).await
    {
        discard_object(state, &path).await;
        return Err(e.into());
    }

    let final_rows = report.table.len();
    tracing::debug!(
        dataset_id = %dataset.dataset_id,
        counters = ?report.metrics.counters(),
        "Cleaning counters"
    );
    Ok(JobOutput {
        result_file: Some(path),
        result: serde_json::to_value(&report.metrics).map_err(sentiprep_common::Error::from)?,
        message: format!("Cleaned dataset has {} rows", final_rows),
    })
}
