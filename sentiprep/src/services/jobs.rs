//! Background job bookkeeping
//!
//! Every state change goes through the in-memory [`Job`] state machine first
//! and is then written to the metadata store.

use super::{ServiceError, ServiceResult};
use crate::db;
use crate::models::{DatasetStatus, Job};
use crate::AppState;
use serde_json::Value;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What a successful stage hands back to the runner
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub result_file: Option<String>,
    pub result: Value,
    pub message: String,
}

/// An accepted job and the task running it
///
/// Dropping the handle detaches the task; it keeps running.
#[derive(Debug)]
pub struct JobHandle {
    pub job: Job,
    task: JoinHandle<Job>,
}

impl JobHandle {
    pub fn job_id(&self) -> Uuid {
        self.job.job_id
    }

    /// Wait for the task and return the job in its final state
    pub async fn wait(self) -> ServiceResult<Job> {
        Ok(self.task.await?)
    }
}

pub async fn get_job(state: &AppState, job_id: Uuid) -> ServiceResult<Job> {
    db::jobs::get_job(&state.db, job_id)
        .await?
        .ok_or(ServiceError::JobNotFound(job_id))
}

/// Persist a queued job and spawn its runner
pub(crate) async fn launch<F>(state: &AppState, job: Job, runner: F) -> ServiceResult<JobHandle>
where
    F: Future<Output = Job> + Send + 'static,
{
    db::jobs::save_job(&state.db, &job).await?;
    info!(
        job_id = %job.job_id,
        dataset_id = %job.dataset_id,
        kind = job.kind.as_str(),
        method = job.method.as_deref().unwrap_or("-"),
        "Job queued"
    );

    let job_id = job.job_id;
    let task = tokio::spawn(async move {
        debug!(job_id = %job_id, "Background job task started");
        runner.await
    });
    Ok(JobHandle { job, task })
}

pub(crate) async fn start_job(state: &AppState, job: &mut Job) -> ServiceResult<()> {
    job.start()?;
    db::jobs::save_job(&state.db, job).await?;
    info!(job_id = %job.job_id, kind = job.kind.as_str(), "Job running");
    Ok(())
}

pub(crate) async fn report_progress(
    state: &AppState,
    job: &mut Job,
    progress: u8,
    message: &str,
) -> ServiceResult<()> {
    job.set_progress(progress, message)?;
    db::jobs::save_job(&state.db, job).await?;
    debug!(job_id = %job.job_id, progress = job.progress, message, "Job progress");
    Ok(())
}

/// Record the outcome of a job and return it in its final state
///
/// On failure the dataset is marked with `failure_status`; that write and the
/// final job write are best-effort.
pub(crate) async fn finish_job(
    state: &AppState,
    mut job: Job,
    outcome: ServiceResult<JobOutput>,
    failure_status: DatasetStatus,
) -> Job {
    match outcome {
        Ok(output) => {
            job.result = Some(output.result);
            match job.complete(output.result_file, output.message) {
                Ok(()) => info!(
                    job_id = %job.job_id,
                    kind = job.kind.as_str(),
                    result_file = job.result_file.as_deref().unwrap_or("-"),
                    "Job completed"
                ),
                Err(e) => error!(job_id = %job.job_id, error = %e, "Could not complete job"),
            }
        }
        Err(e) => {
            error!(job_id = %job.job_id, kind = job.kind.as_str(), error = %e, "Job failed");
            if let Err(transition) = job.fail(e.to_string()) {
                warn!(job_id = %job.job_id, error = %transition, "Could not mark job failed");
            }
            if let Err(status_error) = db::datasets::set_status(&state.db, job.dataset_id, failure_status).await {
                warn!(
                    dataset_id = %job.dataset_id,
                    status = failure_status.as_str(),
                    error = %status_error,
                    "Failed to record dataset failure status"
                );
            }
        }
    }

    if let Err(e) = db::jobs::save_job(&state.db, &job).await {
        warn!(job_id = %job.job_id, error = %e, "Failed to persist final job state");
    }
    job
}

/// Remove an object written by a stage whose metadata write then failed
pub(crate) async fn discard_object(state: &AppState, path: &str) {
    if let Err(e) = state.store.remove(path).await {
        warn!(path, error = %e, "Failed to discard partial output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, JobKind, JobStatus};
    use crate::services::FsObjectStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = sentiprep_common::db::init_memory_database().await.unwrap();
        let state = AppState::new(pool, Arc::new(FsObjectStore::new(dir.path())));
        (state, dir)
    }

    #[tokio::test]
    async fn test_successful_job_is_persisted() {
        let (state, _dir) = state().await;
        let dataset = Dataset::new(Uuid::new_v4(), "raw/a.csv");
        db::datasets::insert_dataset(&state.db, &dataset).await.unwrap();

        let mut job = Job::new(JobKind::Clean, dataset.dataset_id, dataset.session_id);
        start_job(&state, &mut job).await.unwrap();
        report_progress(&state, &mut job, 50, "Halfway").await.unwrap();
        assert_eq!(get_job(&state, job.job_id).await.unwrap().progress, 50);

        let output = JobOutput {
            result_file: Some("cleaned/a.csv".into()),
            result: json!({"final_rows": 3}),
            message: "Done".into(),
        };
        let job = finish_job(&state, job, Ok(output), DatasetStatus::CleaningFailed).await;

        let stored = get_job(&state, job.job_id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.result, Some(json!({"final_rows": 3})));
        assert_eq!(stored.result_file.as_deref(), Some("cleaned/a.csv"));
    }

    #[tokio::test]
    async fn test_failed_job_marks_dataset() {
        let (state, _dir) = state().await;
        let dataset = Dataset::new(Uuid::new_v4(), "raw/a.csv");
        db::datasets::insert_dataset(&state.db, &dataset).await.unwrap();

        let mut job = Job::new(JobKind::Label, dataset.dataset_id, dataset.session_id);
        start_job(&state, &mut job).await.unwrap();
        let outcome = Err(ServiceError::InvalidInput("broken rows".into()));
        finish_job(&state, job.clone(), outcome, DatasetStatus::LabelingFailed).await;

        let stored = get_job(&state, job.job_id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.message, "broken rows");
        let dataset = db::datasets::get_dataset(&state.db, dataset.dataset_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dataset.status, DatasetStatus::LabelingFailed);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (state, _dir) = state().await;
        assert!(matches!(
            get_job(&state, Uuid::nil()).await,
            Err(ServiceError::JobNotFound(_))
        ));
    }
}
